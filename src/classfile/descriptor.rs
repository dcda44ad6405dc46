use crate::error::ClassFileError;

/// Number of local-variable slots taken by the parameters of a method
/// descriptor. `long` and `double` take two slots; the receiver is not
/// included.
pub fn argument_slots(descriptor: &str) -> Result<u16, ClassFileError> {
    let bad = || ClassFileError::BadDescriptor(descriptor.to_string());

    let (params, ret) = descriptor
        .strip_prefix('(')
        .and_then(|rest| rest.split_once(')'))
        .ok_or_else(bad)?;
    if ret.is_empty() {
        return Err(bad());
    }

    let bytes = params.as_bytes();
    let mut slots = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'J' | b'D' => {
                slots += 2;
                i += 1;
            }
            b'B' | b'C' | b'F' | b'I' | b'S' | b'Z' => {
                slots += 1;
                i += 1;
            }
            b'L' => {
                i = skip_object_type(params, i).ok_or_else(bad)?;
                slots += 1;
            }
            b'[' => {
                while bytes.get(i) == Some(&b'[') {
                    i += 1;
                }
                match bytes.get(i) {
                    Some(b'L') => i = skip_object_type(params, i).ok_or_else(bad)?,
                    Some(b'B' | b'C' | b'F' | b'I' | b'S' | b'Z' | b'J' | b'D') => i += 1,
                    _ => return Err(bad()),
                }
                slots += 1;
            }
            _ => return Err(bad()),
        }
    }

    u16::try_from(slots).map_err(|_| bad())
}

/// Index just past the `;` terminating the object type that starts at `at`.
fn skip_object_type(params: &str, at: usize) -> Option<usize> {
    let end = params[at..].find(';')?;
    if end < 2 {
        return None;
    }
    Some(at + end + 1)
}

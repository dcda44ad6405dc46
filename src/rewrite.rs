//! Method body replacement.
//!
//! Every constructor and every declared method of an accepted class gets a
//! fresh `Code` attribute equivalent to
//!
//! ```java
//! throw new UnsupportedOperationException("Methods cannot be called on the API distribution");
//! ```
//!
//! Nothing else about the class changes: existing constant pool entries keep
//! their indices (new ones are only appended, and reused when already
//! present), fields and class attributes are copied verbatim, and members keep
//! their flags (except `native`), descriptors and non-`Code` attributes.
//! Constructors do not call a super constructor; `athrow` is legal while
//! `this` is still uninitialized.
//!
//! The static initializer is neither a method nor a constructor of the class
//! and is left alone.

use tracing::debug;

use crate::classfile::code::opcodes::{ATHROW, DUP, INVOKESPECIAL, LDC, LDC_W, NEW};
use crate::classfile::{
    ACC_ABSTRACT, ACC_NATIVE, ACC_STATIC, CODE_ATTRIBUTE, CONSTRUCTOR_NAME, ClassFile, Code,
    ConstantPool, MemberInfo, STATIC_INITIALIZER_NAME, argument_slots, is_attribute_named,
};
use crate::classpath::LoadedClass;
use crate::error::ClassFileError;

pub const API_MESSAGE: &str = "Methods cannot be called on the API distribution";
pub const UNSUPPORTED_OPERATION_EXCEPTION: &str = "java/lang/UnsupportedOperationException";
const STRING_CONSTRUCTOR_DESCRIPTOR: &str = "(Ljava/lang/String;)V";

/// `new`, `dup`, `ldc`/`ldc_w` push at most three values.
const THROW_MAX_STACK: u16 = 3;

/// Output of the rewriter, stored under the same binary name as its input.
#[derive(Debug, Clone)]
pub struct RewrittenClass {
    pub name: String,
    pub bytes: Vec<u8>,
    pub rewritten_methods: usize,
}

pub fn rewrite_class(class: LoadedClass) -> Result<RewrittenClass, ClassFileError> {
    let name = class.name().to_string();
    let mut class_file = class.into_class_file();
    let rewritten_methods = replace_bodies(&mut class_file)?;
    debug!("Rewrote {rewritten_methods} method bodies of {name}");

    Ok(RewrittenClass {
        name,
        bytes: class_file.to_bytes()?,
        rewritten_methods,
    })
}

/// Rewrites every eligible method in place and returns how many were
/// touched.
pub fn replace_bodies(class_file: &mut ClassFile) -> Result<usize, ClassFileError> {
    let ClassFile {
        constant_pool,
        methods,
        ..
    } = class_file;

    let mut targets = Vec::new();
    for (index, method) in methods.iter().enumerate() {
        if needs_throwing_body(constant_pool, method)? {
            targets.push(index);
        }
    }
    if targets.is_empty() {
        return Ok(0);
    }

    let stub = ThrowStub::intern(constant_pool)?;
    for &index in &targets {
        stub.install(constant_pool, &mut methods[index])?;
    }
    Ok(targets.len())
}

fn needs_throwing_body(pool: &ConstantPool, method: &MemberInfo) -> Result<bool, ClassFileError> {
    if method.has_flag(ACC_ABSTRACT) {
        return Ok(false);
    }
    let name = pool.utf8(method.name_index)?;
    Ok(name != STATIC_INITIALIZER_NAME.as_bytes())
}

/// Pool indices the throwing body refers to.
#[derive(Debug, Clone, Copy)]
struct ThrowStub {
    code_name: u16,
    exception_class: u16,
    message: u16,
    exception_constructor: u16,
}

impl ThrowStub {
    fn intern(pool: &mut ConstantPool) -> Result<Self, ClassFileError> {
        let code_name = pool.intern_utf8(CODE_ATTRIBUTE)?;
        let exception_class = pool.intern_class(UNSUPPORTED_OPERATION_EXCEPTION)?;
        let message = pool.intern_string(API_MESSAGE)?;
        let exception_constructor = pool.intern_method_ref(
            UNSUPPORTED_OPERATION_EXCEPTION,
            CONSTRUCTOR_NAME,
            STRING_CONSTRUCTOR_DESCRIPTOR,
        )?;
        Ok(Self {
            code_name,
            exception_class,
            message,
            exception_constructor,
        })
    }

    fn bytecode(&self) -> Vec<u8> {
        let mut code = Vec::with_capacity(11);
        code.push(NEW);
        code.extend_from_slice(&self.exception_class.to_be_bytes());
        code.push(DUP);
        match u8::try_from(self.message) {
            Ok(index) => code.extend_from_slice(&[LDC, index]),
            Err(_) => {
                code.push(LDC_W);
                code.extend_from_slice(&self.message.to_be_bytes());
            }
        }
        code.push(INVOKESPECIAL);
        code.extend_from_slice(&self.exception_constructor.to_be_bytes());
        code.push(ATHROW);
        code
    }

    fn install(&self, pool: &ConstantPool, method: &mut MemberInfo) -> Result<(), ClassFileError> {
        let descriptor = pool.utf8_string(method.descriptor_index)?;
        let receiver = if method.has_flag(ACC_STATIC) { 0 } else { 1 };
        let max_locals = argument_slots(&descriptor)?
            .checked_add(receiver)
            .ok_or(ClassFileError::BadDescriptor(descriptor))?;

        let code =
            Code::new(THROW_MAX_STACK, max_locals, self.bytecode()).into_attribute(self.code_name)?;

        method.access_flags &= !ACC_NATIVE;
        match method
            .attributes
            .iter()
            .position(|a| is_attribute_named(pool, a, CODE_ATTRIBUTE))
        {
            Some(position) => method.attributes[position] = code,
            None => method.attributes.push(code),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::code::opcodes::*;
    use crate::classfile::*;
    use crate::classpath::ClassBytes;
    use std::path::PathBuf;

    fn load(class: &ClassFile) -> LoadedClass {
        let name = class.name().unwrap().replace('/', ".");
        let found = ClassBytes {
            origin: PathBuf::from("mem"),
            bytes: class.to_bytes().unwrap(),
        };
        LoadedClass::from_bytes(&name, found).unwrap()
    }

    fn foo() -> ClassFile {
        let mut class = ClassFile::new(
            JAVA_8,
            ACC_PUBLIC | ACC_SUPER,
            "com/x/Foo",
            Some("java/lang/Object"),
        )
        .unwrap();
        let object_init = class
            .constant_pool
            .intern_method_ref("java/lang/Object", "<init>", "()V")
            .unwrap();
        let hi = class.constant_pool.intern_string("hi").unwrap() as u8;

        let mut init = vec![ALOAD_0, INVOKESPECIAL];
        init.extend_from_slice(&object_init.to_be_bytes());
        init.push(RETURN);
        class
            .add_method(ACC_PUBLIC, "<init>", "()V", Some(Code::new(1, 1, init)))
            .unwrap();
        class
            .add_method(
                ACC_PUBLIC,
                "add",
                "(II)I",
                Some(Code::new(2, 3, vec![ILOAD_1, ILOAD_2, IADD, IRETURN])),
            )
            .unwrap();
        class
            .add_method(
                ACC_PUBLIC | ACC_STATIC,
                "greet",
                "()Ljava/lang/String;",
                Some(Code::new(1, 0, vec![LDC, hi, ARETURN])),
            )
            .unwrap();
        class
            .add_method(ACC_STATIC, "<clinit>", "()V", Some(Code::new(0, 0, vec![RETURN])))
            .unwrap();
        class
    }

    fn code_of(class: &ClassFile, name: &str) -> Code {
        let method = class
            .methods
            .iter()
            .find(|m| class.member_name(m).unwrap() == name)
            .unwrap();
        let attribute = class.find_attribute(method, CODE_ATTRIBUTE).unwrap();
        Code::parse(&attribute.info).unwrap()
    }

    fn assert_throws(class: &ClassFile, code: &Code) {
        let pool = &class.constant_pool;
        let bytes = &code.code;
        assert_eq!(bytes[0], NEW);
        let class_index = u16::from_be_bytes([bytes[1], bytes[2]]);
        assert_eq!(pool.class_name(class_index).unwrap(), UNSUPPORTED_OPERATION_EXCEPTION);
        assert_eq!(bytes[3], DUP);
        let (message_index, rest) = match bytes[4] {
            LDC => (bytes[5] as u16, &bytes[6..]),
            LDC_W => (u16::from_be_bytes([bytes[5], bytes[6]]), &bytes[7..]),
            other => panic!("unexpected opcode {other:#x}"),
        };
        match pool.get(message_index) {
            Some(Constant::String(utf8)) => {
                assert_eq!(pool.utf8_string(*utf8).unwrap(), API_MESSAGE)
            }
            other => panic!("expected string constant, got {other:?}"),
        }
        assert_eq!(rest[0], INVOKESPECIAL);
        assert_eq!(rest[3], ATHROW);
        assert_eq!(rest.len(), 4);
        assert!(code.exception_table.is_empty());
        assert!(code.attributes.is_empty());
        assert_eq!(code.max_stack, 3);
    }

    #[test]
    fn replaces_constructor_and_method_bodies() {
        let original = foo();
        let rewritten = rewrite_class(load(&original)).unwrap();
        assert_eq!(rewritten.name, "com.x.Foo");
        assert_eq!(rewritten.rewritten_methods, 3);

        let out = ClassFile::parse(&rewritten.bytes).unwrap();
        for (name, locals) in [("<init>", 1), ("add", 3), ("greet", 0)] {
            let code = code_of(&out, name);
            assert_throws(&out, &code);
            assert_eq!(code.max_locals, locals, "max_locals of {name}");
        }
    }

    #[test]
    fn static_initializer_is_preserved() {
        let original = foo();
        let out = ClassFile::parse(&rewrite_class(load(&original)).unwrap().bytes).unwrap();
        assert_eq!(code_of(&out, "<clinit>"), code_of(&original, "<clinit>"));
    }

    #[test]
    fn existing_constant_pool_entries_keep_their_indices() {
        let original = foo();
        let out = ClassFile::parse(&rewrite_class(load(&original)).unwrap().bytes).unwrap();
        for (index, constant) in original.constant_pool.iter() {
            assert_eq!(out.constant_pool.get(index), Some(constant));
        }
        assert_eq!(out.this_class, original.this_class);
        assert_eq!(out.super_class, original.super_class);
        assert_eq!(out.major_version, original.major_version);
    }

    #[test]
    fn native_methods_become_concrete_and_keep_other_flags() {
        let mut class = ClassFile::new(
            JAVA_8,
            ACC_PUBLIC | ACC_SUPER,
            "com/x/Native",
            Some("java/lang/Object"),
        )
        .unwrap();
        class
            .add_method(
                ACC_PUBLIC | ACC_NATIVE | ACC_SYNCHRONIZED | ACC_FINAL,
                "tick",
                "()V",
                None,
            )
            .unwrap();

        let out = ClassFile::parse(&rewrite_class(load(&class)).unwrap().bytes).unwrap();
        let tick = &out.methods[0];
        assert!(!tick.has_flag(ACC_NATIVE));
        assert_eq!(tick.access_flags, ACC_PUBLIC | ACC_SYNCHRONIZED | ACC_FINAL);
        assert_throws(&out, &code_of(&out, "tick"));
        assert_eq!(code_of(&out, "tick").max_locals, 1);
    }

    #[test]
    fn exceptions_and_other_member_attributes_survive() {
        let mut class = ClassFile::new(
            JAVA_8,
            ACC_PUBLIC | ACC_SUPER,
            "com/x/Checked",
            Some("java/lang/Object"),
        )
        .unwrap();
        let io_exception = class.constant_pool.intern_class("java/io/IOException").unwrap();
        let exceptions_name = class.constant_pool.intern_utf8(EXCEPTIONS_ATTRIBUTE).unwrap();
        let deprecated_name = class.constant_pool.intern_utf8("Deprecated").unwrap();
        let mut exceptions = vec![0, 1];
        exceptions.extend_from_slice(&io_exception.to_be_bytes());

        let method = class
            .add_method(ACC_PUBLIC, "op", "()V", Some(Code::new(0, 1, vec![RETURN])))
            .unwrap();
        method.attributes.insert(
            0,
            Attribute {
                name_index: exceptions_name,
                info: exceptions.clone(),
            },
        );
        method.attributes.push(Attribute {
            name_index: deprecated_name,
            info: Vec::new(),
        });

        let out = ClassFile::parse(&rewrite_class(load(&class)).unwrap().bytes).unwrap();
        let op = &out.methods[0];
        let names: Vec<String> = op
            .attributes
            .iter()
            .map(|a| out.attribute_name(a).unwrap())
            .collect();
        assert_eq!(names, vec!["Exceptions", "Code", "Deprecated"]);
        assert_eq!(op.attributes[0].info, exceptions);
        assert_throws(&out, &code_of(&out, "op"));
    }

    #[test]
    fn wide_arguments_count_two_locals() {
        let mut class = ClassFile::new(
            JAVA_8,
            ACC_PUBLIC | ACC_SUPER,
            "com/x/Wide",
            Some("java/lang/Object"),
        )
        .unwrap();
        class
            .add_method(
                ACC_PUBLIC | ACC_STATIC,
                "mix",
                "(JDLjava/lang/String;[I)V",
                Some(Code::new(0, 6, vec![RETURN])),
            )
            .unwrap();
        let out = ClassFile::parse(&rewrite_class(load(&class)).unwrap().bytes).unwrap();
        assert_eq!(code_of(&out, "mix").max_locals, 6);
    }

    #[test]
    fn rewriting_twice_is_byte_identical() {
        let first = rewrite_class(load(&foo())).unwrap();
        let again = ClassFile::parse(&first.bytes).unwrap();
        let second = rewrite_class(load(&again)).unwrap();
        assert_eq!(first.bytes, second.bytes);
    }

    #[test]
    fn large_pools_use_ldc_w() {
        let mut class = ClassFile::new(
            JAVA_8,
            ACC_PUBLIC | ACC_SUPER,
            "com/x/Big",
            Some("java/lang/Object"),
        )
        .unwrap();
        for i in 0..300 {
            class.constant_pool.intern_utf8(&format!("filler{i}")).unwrap();
        }
        class
            .add_method(ACC_PUBLIC, "<init>", "()V", Some(Code::new(0, 1, vec![RETURN])))
            .unwrap();

        let out = ClassFile::parse(&rewrite_class(load(&class)).unwrap().bytes).unwrap();
        let code = code_of(&out, "<init>");
        assert_eq!(code.code[4], LDC_W);
        assert_throws(&out, &code);
    }

    #[test]
    fn malformed_descriptor_is_a_rewrite_error() {
        let mut class = ClassFile::new(
            JAVA_8,
            ACC_PUBLIC | ACC_SUPER,
            "com/x/Bad",
            Some("java/lang/Object"),
        )
        .unwrap();
        class
            .add_method(ACC_PUBLIC, "oops", "(X)V", Some(Code::new(0, 1, vec![RETURN])))
            .unwrap();
        assert!(matches!(
            rewrite_class(load(&class)),
            Err(ClassFileError::BadDescriptor(_))
        ));
    }
}

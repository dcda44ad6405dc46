use serde::Serialize;

use crate::classpath::LoadedClass;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Interfaces, annotation types and `package-info`.
    Interface,
    Abstract,
    /// `module-info` descriptors.
    Module,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Accepted,
    Rejected(RejectReason),
}

/// Only concrete classes get rewritten.
pub fn check(class: &LoadedClass) -> Eligibility {
    if class.is_module() {
        Eligibility::Rejected(RejectReason::Module)
    } else if class.is_interface() {
        Eligibility::Rejected(RejectReason::Interface)
    } else if class.is_abstract() {
        Eligibility::Rejected(RejectReason::Abstract)
    } else {
        Eligibility::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::*;
    use crate::classpath::ClassBytes;
    use std::path::PathBuf;

    fn loaded(access_flags: u16) -> LoadedClass {
        let class =
            ClassFile::new(JAVA_8, access_flags, "com/x/T", Some("java/lang/Object")).unwrap();
        let found = ClassBytes {
            origin: PathBuf::from("mem"),
            bytes: class.to_bytes().unwrap(),
        };
        LoadedClass::from_bytes("com.x.T", found).unwrap()
    }

    #[test]
    fn concrete_classes_are_accepted() {
        assert_eq!(check(&loaded(ACC_PUBLIC | ACC_SUPER)), Eligibility::Accepted);
        assert_eq!(
            check(&loaded(ACC_PUBLIC | ACC_FINAL | ACC_SUPER | ACC_ENUM)),
            Eligibility::Accepted
        );
    }

    #[test]
    fn interfaces_and_annotations_are_rejected() {
        let interface = ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT;
        assert_eq!(
            check(&loaded(interface)),
            Eligibility::Rejected(RejectReason::Interface)
        );
        assert_eq!(
            check(&loaded(interface | ACC_ANNOTATION)),
            Eligibility::Rejected(RejectReason::Interface)
        );
    }

    #[test]
    fn abstract_classes_are_rejected() {
        assert_eq!(
            check(&loaded(ACC_PUBLIC | ACC_ABSTRACT | ACC_SUPER)),
            Eligibility::Rejected(RejectReason::Abstract)
        );
    }

    #[test]
    fn module_descriptors_are_rejected() {
        assert_eq!(
            check(&loaded(ACC_MODULE)),
            Eligibility::Rejected(RejectReason::Module)
        );
    }
}

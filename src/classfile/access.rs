//! Access and property flags (JVMS tables 4.1-B, 4.5-A, 4.6-A).
//!
//! Several bits are shared between class, field and method contexts, so the
//! name list produced by [`flag_names`] depends on the [`FlagContext`].

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_PROTECTED: u16 = 0x0004;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_SUPER: u16 = 0x0020;
pub const ACC_SYNCHRONIZED: u16 = 0x0020;
pub const ACC_VOLATILE: u16 = 0x0040;
pub const ACC_BRIDGE: u16 = 0x0040;
pub const ACC_TRANSIENT: u16 = 0x0080;
pub const ACC_VARARGS: u16 = 0x0080;
pub const ACC_NATIVE: u16 = 0x0100;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_STRICT: u16 = 0x0800;
pub const ACC_SYNTHETIC: u16 = 0x1000;
pub const ACC_ANNOTATION: u16 = 0x2000;
pub const ACC_ENUM: u16 = 0x4000;
pub const ACC_MODULE: u16 = 0x8000;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FlagContext {
    Class,
    Field,
    Method,
}

pub fn flag_names(flags: u16, context: FlagContext) -> Vec<&'static str> {
    let table: &[(u16, &str)] = match context {
        FlagContext::Class => &[
            (ACC_PUBLIC, "public"),
            (ACC_FINAL, "final"),
            (ACC_SUPER, "super"),
            (ACC_INTERFACE, "interface"),
            (ACC_ABSTRACT, "abstract"),
            (ACC_SYNTHETIC, "synthetic"),
            (ACC_ANNOTATION, "annotation"),
            (ACC_ENUM, "enum"),
            (ACC_MODULE, "module"),
        ],
        FlagContext::Field => &[
            (ACC_PUBLIC, "public"),
            (ACC_PRIVATE, "private"),
            (ACC_PROTECTED, "protected"),
            (ACC_STATIC, "static"),
            (ACC_FINAL, "final"),
            (ACC_VOLATILE, "volatile"),
            (ACC_TRANSIENT, "transient"),
            (ACC_SYNTHETIC, "synthetic"),
            (ACC_ENUM, "enum"),
        ],
        FlagContext::Method => &[
            (ACC_PUBLIC, "public"),
            (ACC_PRIVATE, "private"),
            (ACC_PROTECTED, "protected"),
            (ACC_STATIC, "static"),
            (ACC_FINAL, "final"),
            (ACC_SYNCHRONIZED, "synchronized"),
            (ACC_BRIDGE, "bridge"),
            (ACC_VARARGS, "varargs"),
            (ACC_NATIVE, "native"),
            (ACC_ABSTRACT, "abstract"),
            (ACC_STRICT, "strictfp"),
            (ACC_SYNTHETIC, "synthetic"),
        ],
    };

    table
        .iter()
        .filter(|(bit, _)| flags & bit != 0)
        .map(|(_, name)| *name)
        .collect()
}

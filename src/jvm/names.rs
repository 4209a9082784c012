use std::borrow::Cow;
use std::fmt::{Debug, Formatter, Result as FmtResult};

/// Names of methods (`<init>` being the only special one used here)
///
/// See <https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html#jvms-4.2.2>
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct UnqualifiedName(Cow<'static, str>);

/// Slash separated names of classes and interfaces, as they appear in descriptors
///
/// See <https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html#jvms-4.2.1>
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct BinaryName(Cow<'static, str>);

pub trait Name: Sized {
    /// Try to construct a name from a string
    fn from_string(name: String) -> Result<Self, String>;

    /// Underlying string of the name
    fn as_str(&self) -> &str;

    fn from_str(name: &str) -> Result<Self, String> {
        Self::from_string(name.to_owned())
    }
}

fn check_segment(segment: &str, whole: &str) -> Result<(), String> {
    if segment.is_empty() {
        Err(format!("'{}' has an empty name segment", whole))
    } else if let Some(c) = segment.chars().find(|c| matches!(*c, '.' | ';' | '[' | '/')) {
        Err(format!("'{}' contains an illegal character '{}'", whole, c))
    } else {
        Ok(())
    }
}

impl Name for UnqualifiedName {
    fn from_string(name: String) -> Result<Self, String> {
        check_segment(&name, &name)?;
        Ok(UnqualifiedName(Cow::Owned(name)))
    }

    fn as_str(&self) -> &str {
        &self.0
    }
}

impl Name for BinaryName {
    fn from_string(name: String) -> Result<Self, String> {
        for segment in name.split('/') {
            check_segment(segment, &name)?;
        }
        Ok(BinaryName(Cow::Owned(name)))
    }

    fn as_str(&self) -> &str {
        &self.0
    }
}

impl Debug for UnqualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl Debug for BinaryName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl UnqualifiedName {
    /// Name of instance initializers, the only name allowed angle brackets
    pub const INIT: Self = UnqualifiedName(Cow::Borrowed("<init>"));
}

impl BinaryName {
    const fn jdk(value: &'static str) -> BinaryName {
        BinaryName(Cow::Borrowed(value))
    }

    pub const CHARSEQUENCE: Self = Self::jdk("java/lang/CharSequence");
    pub const CLASS: Self = Self::jdk("java/lang/Class");
    pub const CLONEABLE: Self = Self::jdk("java/lang/Cloneable");
    pub const COMPARABLE: Self = Self::jdk("java/lang/Comparable");
    pub const ERROR: Self = Self::jdk("java/lang/Error");
    pub const EXCEPTION: Self = Self::jdk("java/lang/Exception");
    pub const INTEGER: Self = Self::jdk("java/lang/Integer");
    pub const LONG: Self = Self::jdk("java/lang/Long");
    pub const NUMBER: Self = Self::jdk("java/lang/Number");
    pub const OBJECT: Self = Self::jdk("java/lang/Object");
    pub const RUNTIMEEXCEPTION: Self = Self::jdk("java/lang/RuntimeException");
    pub const SERIALIZABLE: Self = Self::jdk("java/io/Serializable");
    pub const STRING: Self = Self::jdk("java/lang/String");
    pub const THROWABLE: Self = Self::jdk("java/lang/Throwable");
}

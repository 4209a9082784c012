use super::{BinaryName, Name};
use crate::util::{RefId, Width};

/// Utility trait for converting descriptors to and from string representations
pub trait RenderDescriptor {
    /// Turn the descriptor into a string
    fn render(&self) -> String {
        let mut string = String::new();
        self.render_to(&mut string);
        string
    }

    /// Write the descriptor to a string
    fn render_to(&self, write_to: &mut String);
}

impl<'g, T: RenderDescriptor> RenderDescriptor for RefId<'g, T> {
    fn render_to(&self, write_to: &mut String) {
        self.0.render_to(write_to)
    }
}

/// Primitive value types
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl Width for BaseType {
    fn width(&self) -> usize {
        match self {
            BaseType::Byte
            | BaseType::Char
            | BaseType::Float
            | BaseType::Int
            | BaseType::Short
            | BaseType::Boolean => 1,
            BaseType::Double | BaseType::Long => 2,
        }
    }
}

impl RenderDescriptor for BaseType {
    fn render_to(&self, write_to: &mut String) {
        let c = match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
        };
        write_to.push(c);
    }
}

/// Reference type
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum RefType<Class> {
    Object(Class),
    ObjectArray(ArrayType<Class>),
    PrimitiveArray(ArrayType<BaseType>),
}

/// Generic array type
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ArrayType<T> {
    /// Additional dimensions (`A[]` has 0 additional dimensions, `A[][][][]` has 3)
    pub additional_dimensions: usize,

    /// Underlying element type (`A` is the underlying element type of `A[][]`)
    pub element_type: T,
}

impl<T> ArrayType<T> {
    pub fn map<T2>(&self, map_element: impl FnOnce(&T) -> T2) -> ArrayType<T2> {
        ArrayType {
            additional_dimensions: self.additional_dimensions,
            element_type: map_element(&self.element_type),
        }
    }

    /// Total number of dimensions in the array type
    ///
    /// This is always just `additional_dimensions + 1`
    pub const fn dimensions(&self) -> usize {
        self.additional_dimensions + 1
    }
}

impl<T: RenderDescriptor> RenderDescriptor for ArrayType<T> {
    fn render_to(&self, write_to: &mut String) {
        for _ in 0..=self.additional_dimensions {
            write_to.push('[');
        }
        self.element_type.render_to(write_to);
    }
}

impl RenderDescriptor for BinaryName {
    fn render_to(&self, write_to: &mut String) {
        write_to.push('L');
        write_to.push_str(self.as_str());
        write_to.push(';');
    }
}

impl<C: RenderDescriptor> RenderDescriptor for RefType<C> {
    fn render_to(&self, write_to: &mut String) {
        match self {
            RefType::Object(cls) => cls.render_to(write_to),
            RefType::PrimitiveArray(arr) => arr.render_to(write_to),
            RefType::ObjectArray(arr) => arr.render_to(write_to),
        }
    }
}

impl<C> RefType<C> {
    /// Replace the class (if there is one) with the outcome of `map_class`
    pub fn try_map<C2, E>(
        &self,
        map_class: impl FnOnce(&C) -> std::result::Result<C2, E>,
    ) -> std::result::Result<RefType<C2>, E> {
        Ok(match self {
            RefType::Object(cls) => RefType::Object(map_class(cls)?),
            RefType::PrimitiveArray(arr) => RefType::PrimitiveArray(*arr),
            RefType::ObjectArray(arr) => RefType::ObjectArray(ArrayType {
                additional_dimensions: arr.additional_dimensions,
                element_type: map_class(&arr.element_type)?,
            }),
        })
    }

    pub fn array(field_type: FieldType<C>) -> RefType<C> {
        match field_type {
            FieldType::Base(element_type) => RefType::PrimitiveArray(ArrayType {
                additional_dimensions: 0,
                element_type,
            }),
            FieldType::Ref(RefType::Object(element_type)) => RefType::ObjectArray(ArrayType {
                additional_dimensions: 0,
                element_type,
            }),
            FieldType::Ref(RefType::PrimitiveArray(arr)) => RefType::PrimitiveArray(ArrayType {
                additional_dimensions: arr.additional_dimensions + 1,
                element_type: arr.element_type,
            }),
            FieldType::Ref(RefType::ObjectArray(arr)) => RefType::ObjectArray(ArrayType {
                additional_dimensions: arr.additional_dimensions + 1,
                element_type: arr.element_type,
            }),
        }
    }
}

/// Type of a class, instance, or local variable
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum FieldType<Class> {
    Base(BaseType),
    Ref(RefType<Class>),
}

impl<C> Width for FieldType<C> {
    fn width(&self) -> usize {
        match self {
            FieldType::Base(base_type) => base_type.width(),
            FieldType::Ref(_) => 1,
        }
    }
}

impl<C> FieldType<C> {
    pub fn array(field_type: FieldType<C>) -> FieldType<C> {
        FieldType::Ref(RefType::array(field_type))
    }

    pub const fn object(class_name: C) -> FieldType<C> {
        FieldType::Ref(RefType::Object(class_name))
    }

    pub const fn int() -> FieldType<C> {
        FieldType::Base(BaseType::Int)
    }

    pub const fn long() -> FieldType<C> {
        FieldType::Base(BaseType::Long)
    }

    pub const fn float() -> FieldType<C> {
        FieldType::Base(BaseType::Float)
    }

    pub const fn boolean() -> FieldType<C> {
        FieldType::Base(BaseType::Boolean)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, FieldType::Ref(_))
    }
}

impl<C: RenderDescriptor> RenderDescriptor for FieldType<C> {
    fn render_to(&self, write_to: &mut String) {
        match self {
            FieldType::Base(base_type) => base_type.render_to(write_to),
            FieldType::Ref(reference_type) => reference_type.render_to(write_to),
        }
    }
}

/// Signature of a method
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub struct MethodDescriptor<Class> {
    pub parameters: Vec<FieldType<Class>>,
    pub return_type: Option<FieldType<Class>>, // `None` is for `void` (ie. no return)
}

impl<C: RenderDescriptor> RenderDescriptor for MethodDescriptor<C> {
    fn render_to(&self, write_to: &mut String) {
        write_to.push('(');
        for parameter in &self.parameters {
            parameter.render_to(write_to);
        }
        write_to.push(')');
        match &self.return_type {
            None => write_to.push('V'),
            Some(typ) => typ.render_to(write_to),
        };
    }
}

impl FieldType<BinaryName> {
    /// Parse a field descriptor such as `I` or `[Ljava/lang/String;`
    pub fn parse(descriptor: &str) -> Result<Self, String> {
        let (field_type, rest) = split_field_type(descriptor)?;
        if rest.is_empty() {
            Ok(field_type)
        } else {
            Err(format!("Unexpected '{}' after field type", rest))
        }
    }
}

impl MethodDescriptor<BinaryName> {
    /// Parse a method descriptor such as `(IJ)Ljava/lang/Object;` or `()V`
    pub fn parse(descriptor: &str) -> Result<Self, String> {
        let mut rest = descriptor
            .strip_prefix('(')
            .ok_or_else(|| "Method descriptor must start with '('".to_owned())?;

        let mut parameters = vec![];
        while !rest.starts_with(')') {
            let (parameter, after) = split_field_type(rest)?;
            parameters.push(parameter);
            rest = after;
        }

        let return_type = match &rest[1..] {
            "V" => None,
            returned => Some(FieldType::<BinaryName>::parse(returned)?),
        };
        Ok(MethodDescriptor {
            parameters,
            return_type,
        })
    }
}

/// Read one field type off the front of a descriptor, returning it and what follows it
fn split_field_type(descriptor: &str) -> Result<(FieldType<BinaryName>, &str), String> {
    let element = descriptor.trim_start_matches('[');
    let dimensions = descriptor.len() - element.len();

    let (element_type, rest) = match element.chars().next() {
        None => return Err(format!("Missing field type in '{}'", descriptor)),
        Some('L') => {
            let end = element
                .find(';')
                .ok_or_else(|| format!("Missing ';' after '{}'", element))?;
            let class_name = BinaryName::from_str(&element[1..end])?;
            (FieldType::object(class_name), &element[end + 1..])
        }
        Some(c) => {
            let base_type = match c {
                'B' => BaseType::Byte,
                'C' => BaseType::Char,
                'D' => BaseType::Double,
                'F' => BaseType::Float,
                'I' => BaseType::Int,
                'J' => BaseType::Long,
                'S' => BaseType::Short,
                'Z' => BaseType::Boolean,
                _ => return Err(format!("Invalid field type character '{}'", c)),
            };
            (FieldType::Base(base_type), &element[c.len_utf8()..])
        }
    };

    let field_type = (0..dimensions).fold(element_type, |inner, _| FieldType::array(inner));
    Ok((field_type, rest))
}
#[cfg(test)]
mod test {
    use super::*;

    type FT = FieldType<BinaryName>;

    const INT: FT = FieldType::Base(BaseType::Int);
    const LONG: FT = FieldType::Base(BaseType::Long);
    const OBJECT: FT = FieldType::object(BinaryName::OBJECT);
    const STRING: FT = FieldType::object(BinaryName::STRING);

    #[test]
    fn field_types() {
        assert_eq!(FT::parse("I"), Ok(INT));
        assert_eq!(OBJECT.render(), "Ljava/lang/Object;");
        assert_eq!(FT::parse("Ljava/lang/Object;"), Ok(OBJECT));

        let longs = FieldType::array(FieldType::array(FieldType::array(LONG)));
        assert_eq!(longs.render(), "[[[J");
        assert_eq!(FT::parse("[[[J"), Ok(longs));
        assert_eq!(FT::parse("[Ljava/lang/String;"), Ok(FieldType::array(STRING)));

        assert!(FT::parse("Ljava/lang/Object").is_err());
        assert!(FT::parse("II").is_err());
        assert!(FT::parse("[").is_err());
        assert!(FT::parse("V").is_err());
    }

    #[test]
    fn method_descriptors() {
        let descriptor = MethodDescriptor {
            parameters: vec![INT, LONG, FieldType::array(STRING)],
            return_type: Some(OBJECT),
        };
        let rendered = "(IJ[Ljava/lang/String;)Ljava/lang/Object;";
        assert_eq!(descriptor.render(), rendered);
        assert_eq!(MethodDescriptor::<BinaryName>::parse(rendered), Ok(descriptor));

        let void = MethodDescriptor::<BinaryName>::parse("()V").unwrap();
        assert_eq!(void.parameters, vec![]);
        assert_eq!(void.return_type, None);
        assert_eq!(void.render(), "()V");

        assert!(MethodDescriptor::<BinaryName>::parse("I)V").is_err());
        assert!(MethodDescriptor::<BinaryName>::parse("(I").is_err());
        assert!(MethodDescriptor::<BinaryName>::parse("()VV").is_err());
    }
}

use crate::ir::DeclaredType;
use crate::jvm::class_graph::{Assignable, ClassId, SubtypeOracle};
use crate::jvm::{ArrayType, BaseType, FieldType, RefType, RenderDescriptor};
use std::fmt;

/// Innermost element of an array type
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ArrayElement<'g> {
    Primitive(BaseType),
    Class(ClassId<'g>),
}

/// Abstract type of a value
///
/// Elements are small `Copy` values compared structurally (classes are compared by identity in
/// the class graph). Every reference element carries a nullability bit.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum TypeLatticeElement<'g> {
    /// Not yet analyzed (identity for [`Self::join`])
    Bottom,

    /// Unconstrained (absorbing for [`Self::join`])
    Top,

    /// Type of the `null` literal
    Null,

    Primitive(BaseType),

    Class {
        class: ClassId<'g>,
        nullable: bool,
    },

    Array {
        array: ArrayType<ArrayElement<'g>>,
        nullable: bool,
    },
}

impl<'g> TypeLatticeElement<'g> {
    pub fn from_field_type(field_type: &FieldType<ClassId<'g>>, nullable: bool) -> Self {
        match field_type {
            FieldType::Base(base_type) => TypeLatticeElement::Primitive(*base_type),
            FieldType::Ref(ref_type) => Self::from_ref_type(ref_type, nullable),
        }
    }

    /// Element for a statically declared type (the `null` type maps to [`Self::Null`])
    pub fn from_declared_type(declared_type: &DeclaredType<'g>, nullable: bool) -> Self {
        match declared_type {
            DeclaredType::Null => TypeLatticeElement::Null,
            DeclaredType::Field(field_type) => Self::from_field_type(field_type, nullable),
        }
    }

    pub fn from_ref_type(ref_type: &RefType<ClassId<'g>>, nullable: bool) -> Self {
        match ref_type {
            RefType::Object(class) => TypeLatticeElement::Class {
                class: *class,
                nullable,
            },
            RefType::PrimitiveArray(array) => TypeLatticeElement::Array {
                array: array.map(|base_type| ArrayElement::Primitive(*base_type)),
                nullable,
            },
            RefType::ObjectArray(array) => TypeLatticeElement::Array {
                array: array.map(|class| ArrayElement::Class(*class)),
                nullable,
            },
        }
    }

    /// Reference type this element denotes (`None` for non-class, non-array elements)
    pub fn to_ref_type(&self) -> Option<RefType<ClassId<'g>>> {
        match self {
            TypeLatticeElement::Class { class, .. } => Some(RefType::Object(*class)),
            TypeLatticeElement::Array { array, .. } => Some(match array.element_type {
                ArrayElement::Primitive(base_type) => RefType::PrimitiveArray(ArrayType {
                    additional_dimensions: array.additional_dimensions,
                    element_type: base_type,
                }),
                ArrayElement::Class(class) => RefType::ObjectArray(ArrayType {
                    additional_dimensions: array.additional_dimensions,
                    element_type: class,
                }),
            }),
            _ => None,
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            TypeLatticeElement::Null => true,
            TypeLatticeElement::Class { nullable, .. }
            | TypeLatticeElement::Array { nullable, .. } => *nullable,
            _ => false,
        }
    }

    pub fn as_nullable(self) -> Self {
        self.with_nullability(true)
    }

    /// Same element, but known to not be null (`Null` itself stays `Null`)
    pub fn as_non_nullable(self) -> Self {
        self.with_nullability(false)
    }

    fn with_nullability(self, nullable: bool) -> Self {
        match self {
            TypeLatticeElement::Class { class, .. } => TypeLatticeElement::Class { class, nullable },
            TypeLatticeElement::Array { array, .. } => TypeLatticeElement::Array { array, nullable },
            other => other,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            TypeLatticeElement::Null
                | TypeLatticeElement::Class { .. }
                | TypeLatticeElement::Array { .. }
        )
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeLatticeElement::Primitive(_))
    }

    pub fn is_definitely_null(&self) -> bool {
        matches!(self, TypeLatticeElement::Null)
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, TypeLatticeElement::Bottom)
    }

    pub fn is_top(&self) -> bool {
        matches!(self, TypeLatticeElement::Top)
    }

    /// Least upper bound of two elements
    pub fn join(self, other: Self, oracle: &dyn SubtypeOracle<'g>) -> Self {
        use TypeLatticeElement::*;

        match (self, other) {
            (Bottom, other) | (other, Bottom) => other,
            (Top, _) | (_, Top) => Top,
            (Null, other) | (other, Null) => match other {
                Primitive(_) => Top,
                other => other.as_nullable(),
            },
            (Primitive(base1), Primitive(base2)) => {
                if base1 == base2 {
                    Primitive(base1)
                } else {
                    Top
                }
            }
            (Primitive(_), _) | (_, Primitive(_)) => Top,

            (
                Class {
                    class: class1,
                    nullable: nullable1,
                },
                Class {
                    class: class2,
                    nullable: nullable2,
                },
            ) => Class {
                class: oracle.least_upper_bound(class1, class2),
                nullable: nullable1 || nullable2,
            },

            (
                Array {
                    array: array1,
                    nullable: nullable1,
                },
                Array {
                    array: array2,
                    nullable: nullable2,
                },
            ) => Self::join_arrays(array1, array2, nullable1 || nullable2, oracle),

            // Arrays and classes only meet at the root
            (Class { nullable: n1, .. }, Array { nullable: n2, .. })
            | (Array { nullable: n1, .. }, Class { nullable: n2, .. }) => Class {
                class: oracle.object_class(),
                nullable: n1 || n2,
            },
        }
    }

    fn join_arrays(
        array1: ArrayType<ArrayElement<'g>>,
        array2: ArrayType<ArrayElement<'g>>,
        nullable: bool,
        oracle: &dyn SubtypeOracle<'g>,
    ) -> Self {
        if array1 == array2 {
            return TypeLatticeElement::Array {
                array: array1,
                nullable,
            };
        }

        let object = oracle.object_class();
        let (depth1, base1) = Self::reduce_array(&array1, object);
        let (depth2, base2) = Self::reduce_array(&array2, object);

        if depth1 == 0 || depth2 == 0 {
            return TypeLatticeElement::Class {
                class: object,
                nullable,
            };
        }
        let (depth, base) = if depth1 == depth2 {
            (depth1, oracle.least_upper_bound(base1, base2))
        } else {
            (depth1.min(depth2), object)
        };
        TypeLatticeElement::Array {
            array: ArrayType {
                additional_dimensions: depth - 1,
                element_type: ArrayElement::Class(base),
            },
            nullable,
        }
    }

    /// Nesting depth and innermost class of an array
    ///
    /// Primitive arrays are one level shallower arrays of `java/lang/Object` (`int[][]` is an
    /// `Object[]` but `int[]` is only an `Object`).
    fn reduce_array(
        array: &ArrayType<ArrayElement<'g>>,
        object: ClassId<'g>,
    ) -> (usize, ClassId<'g>) {
        match array.element_type {
            ArrayElement::Primitive(_) => (array.additional_dimensions, object),
            ArrayElement::Class(class) => (array.dimensions(), class),
        }
    }

    /// Join of every element (`Bottom` for no elements)
    pub fn join_all(
        elements: impl IntoIterator<Item = Self>,
        oracle: &dyn SubtypeOracle<'g>,
    ) -> Self {
        elements
            .into_iter()
            .fold(TypeLatticeElement::Bottom, |acc, element| {
                acc.join(element, oracle)
            })
    }

    pub fn less_than_or_equal(self, other: Self, oracle: &dyn SubtypeOracle<'g>) -> bool {
        self == other || self.join(other, oracle) == other
    }

    pub fn strictly_less_than(self, other: Self, oracle: &dyn SubtypeOracle<'g>) -> bool {
        self != other && self.join(other, oracle) == other
    }

    /// Type of the value after a successful `checkcast`
    ///
    /// A cast never widens: the result is the value's type if that is already assignable to the
    /// cast type (following JVM assignability, so interfaces and array covariance count), and the
    /// cast type (with the value's nullability) otherwise.
    pub fn check_cast(self, cast_type: &RefType<ClassId<'g>>) -> Self {
        match self {
            TypeLatticeElement::Bottom => TypeLatticeElement::Bottom,
            TypeLatticeElement::Null
            | TypeLatticeElement::Top
            | TypeLatticeElement::Primitive(_) => Self::from_ref_type(cast_type, true),
            TypeLatticeElement::Class { .. } | TypeLatticeElement::Array { .. } => {
                let already_narrower = self
                    .to_ref_type()
                    .map_or(false, |ref_type| ref_type.is_assignable(cast_type));
                if already_narrower {
                    self
                } else {
                    Self::from_ref_type(cast_type, self.is_nullable())
                }
            }
        }
    }

    /// Type of an element read out of an array of this type
    ///
    /// Anything other than a known array is `Top`, except `Bottom` which stays `Bottom` until
    /// more is known.
    pub fn array_get(self) -> Self {
        match self {
            TypeLatticeElement::Bottom => TypeLatticeElement::Bottom,
            TypeLatticeElement::Array { array, .. } => match array.additional_dimensions {
                0 => match array.element_type {
                    ArrayElement::Primitive(base_type) => TypeLatticeElement::Primitive(base_type),
                    ArrayElement::Class(class) => TypeLatticeElement::Class {
                        class,
                        nullable: true,
                    },
                },
                n => TypeLatticeElement::Array {
                    array: ArrayType {
                        additional_dimensions: n - 1,
                        element_type: array.element_type,
                    },
                    nullable: true,
                },
            },
            _ => TypeLatticeElement::Top,
        }
    }
}

/// Descriptor syntax, with a trailing `?` on nullable references
impl<'g> fmt::Display for TypeLatticeElement<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeLatticeElement::Bottom => f.write_str("bottom"),
            TypeLatticeElement::Top => f.write_str("top"),
            TypeLatticeElement::Null => f.write_str("null"),
            TypeLatticeElement::Primitive(base_type) => f.write_str(&base_type.render()),
            TypeLatticeElement::Class { nullable, .. }
            | TypeLatticeElement::Array { nullable, .. } => {
                if let Some(ref_type) = self.to_ref_type() {
                    f.write_str(&ref_type.render())?;
                }
                if *nullable {
                    f.write_str("?")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::class_graph::{ClassData, ClassGraph, ClassGraphArenas, JavaClasses};
    use crate::jvm::{BinaryName, ClassAccessFlags, Name};

    struct Hierarchy<'g> {
        java: JavaClasses<'g>,
        a: ClassId<'g>,
        b: ClassId<'g>,
        c: ClassId<'g>,
    }

    /// `B <: A` and `C <: A`
    fn hierarchy<'g>(class_graph: &ClassGraph<'g>) -> Hierarchy<'g> {
        let java = class_graph.insert_java_library_types().unwrap();
        let class = |name: &str, superclass| {
            class_graph
                .add_class(ClassData::new(
                    BinaryName::from_str(name).unwrap(),
                    superclass,
                    ClassAccessFlags::PUBLIC,
                ))
                .unwrap()
        };
        let a = class("me/A", java.lang.object);
        let b = class("me/B", a);
        let c = class("me/C", a);
        Hierarchy { java, a, b, c }
    }

    fn class<'g>(class: ClassId<'g>, nullable: bool) -> TypeLatticeElement<'g> {
        TypeLatticeElement::Class { class, nullable }
    }

    fn array<'g>(element_type: FieldType<ClassId<'g>>, nullable: bool) -> TypeLatticeElement<'g> {
        TypeLatticeElement::from_ref_type(&RefType::array(element_type), nullable)
    }

    fn samples<'g>(h: &Hierarchy<'g>) -> Vec<TypeLatticeElement<'g>> {
        let int = FieldType::int();
        vec![
            TypeLatticeElement::Bottom,
            TypeLatticeElement::Top,
            TypeLatticeElement::Null,
            TypeLatticeElement::Primitive(BaseType::Int),
            TypeLatticeElement::Primitive(BaseType::Long),
            class(h.java.lang.object, false),
            class(h.java.lang.object, true),
            class(h.a, false),
            class(h.b, false),
            class(h.b, true),
            class(h.c, true),
            class(h.java.lang.integer, false),
            class(h.java.lang.comparable, false),
            array(int, false),
            array(FieldType::long(), true),
            array(FieldType::array(int), true),
            array(FieldType::object(h.java.lang.object), false),
            array(FieldType::object(h.a), false),
            array(FieldType::object(h.b), true),
            array(FieldType::array(FieldType::object(h.c)), false),
            array(
                FieldType::array(FieldType::array(FieldType::object(h.java.lang.object))),
                false,
            ),
        ]
    }

    #[test]
    fn join_laws() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let h = hierarchy(&class_graph);
        let oracle: &dyn SubtypeOracle = &class_graph;
        let samples = samples(&h);

        for &a in &samples {
            assert_eq!(TypeLatticeElement::Bottom.join(a, oracle), a);
            assert_eq!(
                TypeLatticeElement::Top.join(a, oracle),
                TypeLatticeElement::Top
            );
            assert_eq!(a.join(a, oracle), a, "{} is idempotent", a);

            for &b in &samples {
                let ab = a.join(b, oracle);
                assert_eq!(ab, b.join(a, oracle), "{} ⊔ {} commutes", a, b);
                assert!(a.less_than_or_equal(ab, oracle), "{} <= {}", a, ab);
                assert!(b.less_than_or_equal(ab, oracle), "{} <= {}", b, ab);
                if a.is_reference() && b.is_reference() && (a.is_nullable() || b.is_nullable()) {
                    assert!(ab.is_nullable(), "{} ⊔ {} is nullable", a, b);
                }

                for &c in &samples {
                    assert_eq!(
                        ab.join(c, oracle),
                        a.join(b.join(c, oracle), oracle),
                        "({} ⊔ {}) ⊔ {} associates",
                        a,
                        b,
                        c
                    );
                }
            }
        }
    }

    #[test]
    fn class_join() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let h = hierarchy(&class_graph);

        assert_eq!(
            class(h.b, false).join(class(h.c, true), &class_graph),
            class(h.a, true)
        );
        assert_eq!(
            class(h.b, false).join(class(h.a, false), &class_graph),
            class(h.a, false)
        );
        assert_eq!(
            TypeLatticeElement::Null.join(class(h.b, false), &class_graph),
            class(h.b, true)
        );
        assert_eq!(
            class(h.b, false).join(array(FieldType::int(), false), &class_graph),
            class(h.java.lang.object, false)
        );
    }

    #[test]
    fn primitive_join() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let int = TypeLatticeElement::Primitive(BaseType::Int);
        let float = TypeLatticeElement::Primitive(BaseType::Float);

        assert_eq!(int.join(int, &class_graph), int);
        assert_eq!(int.join(float, &class_graph), TypeLatticeElement::Top);
        assert_eq!(
            TypeLatticeElement::Null.join(int, &class_graph),
            TypeLatticeElement::Top
        );
        assert!(int.strictly_less_than(TypeLatticeElement::Top, &class_graph));
        assert!(!int.strictly_less_than(int, &class_graph));
    }

    #[test]
    fn array_join() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let h = hierarchy(&class_graph);
        let object = FieldType::object(h.java.lang.object);

        // int[][] ⊔ Object[][][] = Object[]
        let int_2d = array(FieldType::array(FieldType::int()), false);
        let object_3d = array(FieldType::array(FieldType::array(object)), true);
        assert_eq!(int_2d.join(object_3d, &class_graph), array(object, true));

        // B[] ⊔ C[] = A[]
        let b_array = array(FieldType::object(h.b), false);
        let c_array = array(FieldType::object(h.c), false);
        assert_eq!(
            b_array.join(c_array, &class_graph),
            array(FieldType::object(h.a), false)
        );

        // int[] ⊔ long[] = Object
        assert_eq!(
            array(FieldType::int(), false).join(array(FieldType::long(), false), &class_graph),
            class(h.java.lang.object, false)
        );

        // int[] ⊔ int[] = int[]
        assert_eq!(
            array(FieldType::int(), false).join(array(FieldType::int(), true), &class_graph),
            array(FieldType::int(), true)
        );
    }

    #[test]
    fn check_cast_narrows() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let h = hierarchy(&class_graph);
        let cast_b = RefType::Object(h.b);
        let cast_a = RefType::Object(h.a);

        assert_eq!(
            class(h.a, true).check_cast(&cast_b),
            class(h.b, true)
        );
        assert_eq!(
            TypeLatticeElement::Null.check_cast(&cast_b),
            class(h.b, true)
        );
        assert_eq!(
            class(h.b, false).check_cast(&cast_a),
            class(h.b, false)
        );
        assert_eq!(
            class(h.a, false).check_cast(&cast_b),
            class(h.b, false)
        );
        assert_eq!(
            TypeLatticeElement::Bottom.check_cast(&cast_b),
            TypeLatticeElement::Bottom
        );

        // Interfaces are handled through subtyping, not just the join
        let comparable = RefType::Object(h.java.lang.comparable);
        assert_eq!(
            class(h.java.lang.integer, false).check_cast(&comparable),
            class(h.java.lang.integer, false)
        );

        let object = RefType::Object(h.java.lang.object);
        let ints = array(FieldType::int(), true);
        assert_eq!(ints.check_cast(&object), ints);

        // Arrays are covariant, and every array is `Cloneable` and `Serializable`
        let strings = array(FieldType::object(h.java.lang.string), false);
        let comparables = RefType::array(FieldType::object(h.java.lang.comparable));
        assert_eq!(strings.check_cast(&comparables), strings);
        let cloneable = RefType::Object(h.java.lang.cloneable);
        let serializable = RefType::Object(h.java.io.serializable);
        assert_eq!(ints.check_cast(&cloneable), ints);
        assert_eq!(ints.check_cast(&serializable), ints);
        let int_matrix = array(FieldType::array(FieldType::int()), false);
        let objects = RefType::array(FieldType::object(h.java.lang.object));
        assert_eq!(int_matrix.check_cast(&objects), int_matrix);

        // Casting an array to an unrelated array or a class still takes the cast type
        let a_array = RefType::array(FieldType::object(h.a));
        assert_eq!(
            strings.check_cast(&a_array),
            array(FieldType::object(h.a), false)
        );
        assert_eq!(ints.check_cast(&RefType::Object(h.a)), class(h.a, true));
    }

    #[test]
    fn array_get() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let h = hierarchy(&class_graph);

        assert_eq!(
            array(FieldType::int(), false).array_get(),
            TypeLatticeElement::Primitive(BaseType::Int)
        );
        assert_eq!(
            array(FieldType::object(h.b), false).array_get(),
            class(h.b, true)
        );
        assert_eq!(
            array(FieldType::array(FieldType::object(h.b)), false).array_get(),
            array(FieldType::object(h.b), true)
        );
        assert_eq!(class(h.b, false).array_get(), TypeLatticeElement::Top);
        assert_eq!(
            TypeLatticeElement::Bottom.array_get(),
            TypeLatticeElement::Bottom
        );
    }

    #[test]
    fn rendering() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let h = hierarchy(&class_graph);

        assert_eq!(class(h.java.lang.object, true).to_string(), "Ljava/lang/Object;?");
        assert_eq!(
            array(FieldType::array(FieldType::int()), false).to_string(),
            "[[I"
        );
        assert_eq!(TypeLatticeElement::Primitive(BaseType::Long).to_string(), "J");
        assert_eq!(TypeLatticeElement::Null.to_string(), "null");
        assert_eq!(
            TypeLatticeElement::from_declared_type(&DeclaredType::Null, false),
            TypeLatticeElement::Null
        );
    }
}

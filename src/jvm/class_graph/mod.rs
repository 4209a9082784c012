//! Class hierarchy shared by every method being processed
//!
//! The type lattice only ever needs two questions answered about classes: "is this class a
//! subtype of that one?" and "what is the closest class both of these extend?". Those questions
//! are captured by [`SubtypeOracle`], and [`ClassGraph`] is the arena backed implementation of it.
//!
//! Once all classes have been added, the graph is only ever read. Adding classes requires just a
//! shared reference (the arenas and frozen collections take care of that), so references to
//! classes handed out earlier stay valid as the graph grows.

use super::{
    BinaryName, ClassAccessFlags, Error, FieldType, MethodAccessFlags, MethodDescriptor, Name,
    RenderDescriptor, UnqualifiedName,
};
use crate::util::RefId;
use elsa::map::FrozenMap;
use elsa::FrozenVec;
use std::collections::HashSet;
use std::fmt;
use std::fmt::Debug;
use typed_arena::Arena;

mod assignable;
mod java_classes;

pub use assignable::*;
pub use java_classes::*;

/// Class in the class graph, compared by identity
pub type ClassId<'g> = RefId<'g, ClassData<'g>>;

/// Method in the class graph, compared by identity
pub type MethodId<'g> = RefId<'g, MethodData<'g>>;

pub struct ClassGraphArenas<'g> {
    class_arena: Arena<ClassData<'g>>,
    method_arena: Arena<MethodData<'g>>,
}

impl<'g> ClassGraphArenas<'g> {
    pub fn new() -> Self {
        ClassGraphArenas {
            class_arena: Arena::new(),
            method_arena: Arena::new(),
        }
    }
}

impl<'g> Default for ClassGraphArenas<'g> {
    fn default() -> Self {
        Self::new()
    }
}

/// Subtyping queries the type lattice relies on
///
/// Implementations must be deterministic, total over every class reachable in the compilation,
/// and must not change while an analysis is running.
pub trait SubtypeOracle<'g> {
    /// The root of the class hierarchy (`java.lang.Object`)
    fn object_class(&self) -> ClassId<'g>;

    /// Most specific class that both classes are assignable to
    ///
    /// Falls back to [`Self::object_class`] when there is nothing tighter.
    fn least_upper_bound(&self, class1: ClassId<'g>, class2: ClassId<'g>) -> ClassId<'g>;

    /// Is the first class assignable to the second?
    fn is_subtype_of(&self, sub_class: ClassId<'g>, super_class: ClassId<'g>) -> bool;
}

/// Tracks the relationships between classes/interfaces and the methods on those classes
pub struct ClassGraph<'g> {
    arenas: &'g ClassGraphArenas<'g>,
    classes: FrozenMap<BinaryName, Box<ClassId<'g>>>,
    object: ClassId<'g>,
}

impl<'g> ClassGraph<'g> {
    /// New graph containing only `java/lang/Object`
    pub fn new(arenas: &'g ClassGraphArenas<'g>) -> Self {
        let object = RefId(&*arenas.class_arena.alloc(ClassData {
            name: BinaryName::OBJECT,
            superclass: None,
            interfaces: FrozenVec::new(),
            access_flags: ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
            methods: FrozenVec::new(),
        }));
        let classes = FrozenMap::new();
        classes.insert(BinaryName::OBJECT, Box::new(object));
        ClassGraph {
            arenas,
            classes,
            object,
        }
    }

    /// Add a new class to the class graph
    pub fn add_class(&self, data: ClassData<'g>) -> Result<ClassId<'g>, Error> {
        if self.classes.get(&data.name).is_some() {
            return Err(Error::DuplicateClass(data.name));
        }
        let class = RefId(&*self.arenas.class_arena.alloc(data));
        self.classes.insert(class.name.clone(), Box::new(class));
        Ok(class)
    }

    /// Add a method to the class graph and to its class
    ///
    /// If an identical method (same name, descriptor, and staticness) already exists, that one is
    /// returned instead.
    pub fn add_method(&self, method: MethodData<'g>) -> MethodId<'g> {
        let class: &'g ClassData<'g> = method.class.0;
        if let Some(existing) = class.methods.iter().find(|m| {
            m.name == method.name
                && m.descriptor == method.descriptor
                && m.is_static() == method.is_static()
        }) {
            return RefId(existing);
        }
        let data = RefId(&*self.arenas.method_arena.alloc(method));
        data.class.methods.push(data);
        data
    }

    /// Find a class by name
    pub fn lookup_class(&self, name: &BinaryName) -> Option<ClassId<'g>> {
        self.classes.get(name).copied()
    }

    /// Find a class by name, failing if it isn't in the graph
    pub fn resolve_class(&self, name: &BinaryName) -> Result<ClassId<'g>, Error> {
        self.lookup_class(name)
            .ok_or_else(|| Error::MissingClass(name.clone()))
    }

    /// Parse a field descriptor and resolve every class it mentions
    pub fn field_type(&self, descriptor: &str) -> Result<FieldType<ClassId<'g>>, Error> {
        let parsed = FieldType::<BinaryName>::parse(descriptor)
            .map_err(|err| Error::InvalidDescriptor(descriptor.to_owned(), err))?;
        self.resolve_field_type(&parsed)
    }

    /// Parse a method descriptor and resolve every class it mentions
    pub fn method_descriptor(
        &self,
        descriptor: &str,
    ) -> Result<MethodDescriptor<ClassId<'g>>, Error> {
        let parsed = MethodDescriptor::<BinaryName>::parse(descriptor)
            .map_err(|err| Error::InvalidDescriptor(descriptor.to_owned(), err))?;
        Ok(MethodDescriptor {
            parameters: parsed
                .parameters
                .iter()
                .map(|parameter| self.resolve_field_type(parameter))
                .collect::<Result<_, _>>()?,
            return_type: parsed
                .return_type
                .as_ref()
                .map(|return_type| self.resolve_field_type(return_type))
                .transpose()?,
        })
    }

    fn resolve_field_type(
        &self,
        field_type: &FieldType<BinaryName>,
    ) -> Result<FieldType<ClassId<'g>>, Error> {
        Ok(match field_type {
            FieldType::Base(base_type) => FieldType::Base(*base_type),
            FieldType::Ref(ref_type) => {
                FieldType::Ref(ref_type.try_map(|name| self.resolve_class(name))?)
            }
        })
    }

    /// Add standard types to the class graph
    pub fn insert_java_library_types(&self) -> Result<JavaClasses<'g>, Error> {
        JavaClasses::add_to_graph(self)
    }

    /// Superclass chain, starting with the class itself and ending at `java/lang/Object`
    fn superclass_chain(class: ClassId<'g>) -> impl Iterator<Item = ClassId<'g>> {
        std::iter::successors(Some(class), |class| class.superclass)
    }
}

impl<'g> SubtypeOracle<'g> for ClassGraph<'g> {
    fn object_class(&self) -> ClassId<'g> {
        self.object
    }

    /// Lowest common ancestor along superclass edges
    ///
    /// Interfaces have `java/lang/Object` as their superclass, so joining an interface with
    /// anything other than itself yields `java/lang/Object`. This matches how the JVM verifier
    /// merges types and keeps the operation associative (there is no unique least interface in a
    /// diamond).
    fn least_upper_bound(&self, class1: ClassId<'g>, class2: ClassId<'g>) -> ClassId<'g> {
        if class1 == class2 {
            return class1;
        }
        let ancestors: HashSet<ClassId<'g>> = Self::superclass_chain(class1).collect();
        Self::superclass_chain(class2)
            .find(|class| ancestors.contains(class))
            .unwrap_or(self.object)
    }

    fn is_subtype_of(&self, sub_class: ClassId<'g>, super_class: ClassId<'g>) -> bool {
        sub_class.is_assignable(&super_class)
    }
}

pub struct ClassData<'g> {
    /// Name of the class
    pub name: BinaryName,

    /// Superclass is only ever missing for `java/lang/Object` itself
    pub superclass: Option<ClassId<'g>>,

    /// Interfaces implemented (or super-interfaces)
    pub interfaces: FrozenVec<ClassId<'g>>,

    /// Access flags
    pub access_flags: ClassAccessFlags,

    /// Methods
    pub methods: FrozenVec<MethodId<'g>>,
}

impl<'g> ClassData<'g> {
    pub fn new(
        name: BinaryName,
        superclass: ClassId<'g>,
        access_flags: ClassAccessFlags,
    ) -> ClassData<'g> {
        ClassData {
            name,
            superclass: Some(superclass),
            interfaces: FrozenVec::new(),
            access_flags,
            methods: FrozenVec::new(),
        }
    }

    /// Same as [`Self::new`], but also registering interfaces
    pub fn with_interfaces(
        name: BinaryName,
        superclass: ClassId<'g>,
        access_flags: ClassAccessFlags,
        interfaces: impl IntoIterator<Item = ClassId<'g>>,
    ) -> ClassData<'g> {
        let data = ClassData::new(name, superclass, access_flags);
        for interface in interfaces {
            data.interfaces.push(interface);
        }
        data
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::INTERFACE)
    }
}

impl<'g> PartialEq for ClassData<'g> {
    fn eq(&self, other: &ClassData<'g>) -> bool {
        self.name == other.name
    }
}

impl<'g> Eq for ClassData<'g> {}

impl<'g> RenderDescriptor for ClassData<'g> {
    fn render_to(&self, write_to: &mut String) {
        self.name.render_to(write_to)
    }
}

impl<'g> Debug for ClassData<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_str())
    }
}

pub struct MethodData<'g> {
    /// Class declaring the method
    ///
    /// Note: this is a pointer back to the class (so don't derive `Debug`)
    pub class: ClassId<'g>,

    /// Name of the method
    pub name: UnqualifiedName,

    /// Type of the method
    pub descriptor: MethodDescriptor<ClassId<'g>>,

    /// Access flags
    pub access_flags: MethodAccessFlags,
}

impl<'g> MethodData<'g> {
    pub fn is_static(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::STATIC)
    }

    /// Number of argument values the method body starts with (including the receiver)
    pub fn argument_count(&self) -> usize {
        self.descriptor.parameters.len() + usize::from(!self.is_static())
    }
}

impl<'g> Debug for MethodData<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!(
            "{}.{}:{}",
            self.class.name.as_str(),
            self.name.as_str(),
            self.descriptor.render(),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn least_upper_bound_of_classes() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library_types().unwrap();

        let object = java.lang.object;
        let number = java.lang.number;
        let integer = java.lang.integer;
        let long = java.lang.long;
        let string = java.lang.string;

        assert_eq!(class_graph.least_upper_bound(integer, long), number);
        assert_eq!(class_graph.least_upper_bound(long, integer), number);
        assert_eq!(class_graph.least_upper_bound(integer, number), number);
        assert_eq!(class_graph.least_upper_bound(integer, integer), integer);
        assert_eq!(class_graph.least_upper_bound(integer, string), object);
        assert_eq!(class_graph.least_upper_bound(object, string), object);
    }

    #[test]
    fn interfaces_join_at_object() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library_types().unwrap();

        let string = java.lang.string;
        let char_sequence = java.lang.char_sequence;

        assert!(class_graph.is_subtype_of(string, char_sequence));
        assert_eq!(
            class_graph.least_upper_bound(string, char_sequence),
            java.lang.object
        );
        assert_eq!(
            class_graph.least_upper_bound(char_sequence, char_sequence),
            char_sequence
        );
    }

    #[test]
    fn duplicate_and_missing_classes() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let object = class_graph.object_class();

        let name = BinaryName::from_str("me/Point").unwrap();
        let point = class_graph
            .add_class(ClassData::new(name.clone(), object, ClassAccessFlags::PUBLIC))
            .unwrap();
        assert_eq!(class_graph.lookup_class(&name), Some(point));
        assert!(matches!(
            class_graph.add_class(ClassData::new(name, object, ClassAccessFlags::PUBLIC)),
            Err(Error::DuplicateClass(_))
        ));
        assert!(matches!(
            class_graph.field_type("Lme/Missing;"),
            Err(Error::MissingClass(_))
        ));
        assert!(matches!(
            class_graph.field_type("Lme/Point"),
            Err(Error::InvalidDescriptor(_, _))
        ));
    }

    #[test]
    fn resolving_descriptors() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library_types().unwrap();

        let descriptor = class_graph
            .method_descriptor("(I[Ljava/lang/String;)Ljava/lang/Number;")
            .unwrap();
        assert_eq!(
            descriptor,
            MethodDescriptor {
                parameters: vec![
                    FieldType::int(),
                    FieldType::array(FieldType::object(java.lang.string))
                ],
                return_type: Some(FieldType::object(java.lang.number)),
            }
        );

        let method = class_graph.add_method(MethodData {
            class: java.lang.string,
            name: UnqualifiedName::from_str("foo").unwrap(),
            descriptor: descriptor.clone(),
            access_flags: MethodAccessFlags::PUBLIC,
        });
        assert_eq!(method.argument_count(), 3);
        assert_eq!(format!("{:?}", method), "java/lang/String.foo:(I[Ljava/lang/String;)Ljava/lang/Number;");

        let again = class_graph.add_method(MethodData {
            class: java.lang.string,
            name: UnqualifiedName::from_str("foo").unwrap(),
            descriptor,
            access_flags: MethodAccessFlags::PUBLIC,
        });
        assert_eq!(method, again);
    }
}

use super::{BinaryName, ClassAccessFlags, ClassData, ClassGraph, ClassId, Error, SubtypeOracle};

/// Classes inside `java.*`
pub struct JavaClasses<'g> {
    pub lang: LangClasses<'g>,
    pub io: IoClasses<'g>,
}

/// Classes inside `java.lang.*`
pub struct LangClasses<'g> {
    pub object: ClassId<'g>,
    pub cloneable: ClassId<'g>,
    pub comparable: ClassId<'g>,
    pub char_sequence: ClassId<'g>,
    pub string: ClassId<'g>,
    pub class: ClassId<'g>,
    pub number: ClassId<'g>,
    pub integer: ClassId<'g>,
    pub long: ClassId<'g>,
    pub throwable: ClassId<'g>,
    pub error: ClassId<'g>,
    pub exception: ClassId<'g>,
    pub runtime_exception: ClassId<'g>,
}

/// Classes inside `java.io.*`
pub struct IoClasses<'g> {
    pub serializable: ClassId<'g>,
}

impl<'g> JavaClasses<'g> {
    pub fn add_to_graph(class_graph: &ClassGraph<'g>) -> Result<JavaClasses<'g>, Error> {
        let object = class_graph.object_class();
        let io = IoClasses::add_to_graph(class_graph, object)?;
        let lang = LangClasses::add_to_graph(class_graph, &io)?;

        Ok(JavaClasses { lang, io })
    }
}

impl<'g> IoClasses<'g> {
    pub fn add_to_graph(
        class_graph: &ClassGraph<'g>,
        object: ClassId<'g>,
    ) -> Result<IoClasses<'g>, Error> {
        let serializable = class_graph.add_class(ClassData::new(
            BinaryName::SERIALIZABLE,
            object,
            interface_flags(),
        ))?;

        Ok(IoClasses { serializable })
    }
}

impl<'g> LangClasses<'g> {
    pub fn add_to_graph(
        class_graph: &ClassGraph<'g>,
        io: &IoClasses<'g>,
    ) -> Result<LangClasses<'g>, Error> {
        let object = class_graph.object_class();
        let serializable = io.serializable;

        let cloneable = class_graph.add_class(ClassData::new(
            BinaryName::CLONEABLE,
            object,
            interface_flags(),
        ))?;
        let comparable = class_graph.add_class(ClassData::new(
            BinaryName::COMPARABLE,
            object,
            interface_flags(),
        ))?;
        let char_sequence = class_graph.add_class(ClassData::new(
            BinaryName::CHARSEQUENCE,
            object,
            interface_flags(),
        ))?;
        let string = class_graph.add_class(ClassData::with_interfaces(
            BinaryName::STRING,
            object,
            ClassAccessFlags::PUBLIC | ClassAccessFlags::FINAL | ClassAccessFlags::SUPER,
            [serializable, comparable, char_sequence],
        ))?;
        let class = class_graph.add_class(ClassData::with_interfaces(
            BinaryName::CLASS,
            object,
            ClassAccessFlags::PUBLIC | ClassAccessFlags::FINAL | ClassAccessFlags::SUPER,
            [serializable],
        ))?;
        let number = class_graph.add_class(ClassData::with_interfaces(
            BinaryName::NUMBER,
            object,
            ClassAccessFlags::PUBLIC | ClassAccessFlags::ABSTRACT | ClassAccessFlags::SUPER,
            [serializable],
        ))?;
        let integer = class_graph.add_class(ClassData::with_interfaces(
            BinaryName::INTEGER,
            number,
            ClassAccessFlags::PUBLIC | ClassAccessFlags::FINAL | ClassAccessFlags::SUPER,
            [comparable],
        ))?;
        let long = class_graph.add_class(ClassData::with_interfaces(
            BinaryName::LONG,
            number,
            ClassAccessFlags::PUBLIC | ClassAccessFlags::FINAL | ClassAccessFlags::SUPER,
            [comparable],
        ))?;
        let throwable = class_graph.add_class(ClassData::with_interfaces(
            BinaryName::THROWABLE,
            object,
            ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
            [serializable],
        ))?;
        let error = class_graph.add_class(ClassData::new(
            BinaryName::ERROR,
            throwable,
            ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
        ))?;
        let exception = class_graph.add_class(ClassData::new(
            BinaryName::EXCEPTION,
            throwable,
            ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
        ))?;
        let runtime_exception = class_graph.add_class(ClassData::new(
            BinaryName::RUNTIMEEXCEPTION,
            exception,
            ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
        ))?;

        Ok(LangClasses {
            object,
            cloneable,
            comparable,
            char_sequence,
            string,
            class,
            number,
            integer,
            long,
            throwable,
            error,
            exception,
            runtime_exception,
        })
    }
}

fn interface_flags() -> ClassAccessFlags {
    ClassAccessFlags::PUBLIC | ClassAccessFlags::INTERFACE | ClassAccessFlags::ABSTRACT
}

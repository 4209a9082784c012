use super::BinaryName;

#[derive(Debug)]
pub enum Error {
    /// A class was referenced but never added to the class graph
    MissingClass(BinaryName),

    /// A class with this name has already been added to the class graph
    DuplicateClass(BinaryName),

    /// A descriptor could not be parsed
    InvalidDescriptor(String, String),
}

pub mod literal;
pub use literal::Literal;

pub mod literal_serializer;
pub use literal_serializer::LiteralSerializer;

pub mod crypto;
pub mod normalize;

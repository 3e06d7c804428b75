//! ドメイン層
//! 
//! ビジネスロジックとドメインモデルを含む層

pub mod migration;
pub mod platform;

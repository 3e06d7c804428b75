//! アプリケーション層
//!
//! 移行の各ステージをユースケースとして組み立てる層

pub mod use_cases;

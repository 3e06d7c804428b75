//! # Distiller Migrate
//!
//! Distiller デバイスの apt リポジトリを unstable から testing チャネルへ
//! 一度だけ移行し、完了後に自身の systemd ユニットとスクリプトを削除する
//! オーケストレータ
//!
//! このクレートは Domain-Driven Design (DDD) 原則に基づいて設計されており、
//! 以下の層に分かれています：
//!
//! - **Domain Layer**: プラットフォーム判定と移行ステートのモデル
//! - **Application Layer**: プリフライト、ロック待機、移行、クリーンアップのユースケース
//! - **Infrastructure Layer**: apt、systemd、ファイルシステムとの統合

// Rust 2024 Edition 準拠の構造
pub mod application;
pub mod config;
pub mod debug;
pub mod domain;
pub mod infrastructure;

// 公開API
pub use config::Settings;
pub use domain::migration::MigrationError;

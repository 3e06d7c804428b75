//! インフラストラクチャ層
//!
//! apt・systemd・ファイルシステムなど外部システムとの統合

pub mod system;

//! Ingestion 错误类型

use std::path::PathBuf;

use contracts::ContractError;
use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 录制文件无法打开或解析
    #[error("failed to load recording {path}: {source}")]
    Recording {
        path: PathBuf,
        #[source]
        source: ContractError,
    },

    /// 同名数据源已注册
    #[error("source {source_id} is already registered")]
    AlreadyRegistered { source_id: String },

    /// 场景配置非法
    #[error("invalid scenario: {message}")]
    InvalidScenario { message: String },
}

impl IngestionError {
    pub fn recording(path: impl Into<PathBuf>, source: ContractError) -> Self {
        Self::Recording {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_scenario(message: impl Into<String>) -> Self {
        Self::InvalidScenario {
            message: message.into(),
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;

//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;

/// 应用主配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// 克隆服务配置
    #[serde(default)]
    pub cloning: CloningConfig,

    /// 麦克风采集配置
    #[serde(default)]
    pub capture: CaptureConfig,

    /// 播放配置
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cloning: CloningConfig::default(),
            capture: CaptureConfig::default(),
            playback: PlaybackConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// 克隆服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct CloningConfig {
    /// 克隆服务基础 URL（Modal 部署的 Chatterbox TTS 端点）
    #[serde(default = "default_cloning_url")]
    pub url: String,

    /// 单次请求超时时间（秒）
    #[serde(default = "default_cloning_timeout")]
    pub timeout_secs: u64,

    /// ServiceUnavailable 的最大重试次数（submit 与 poll 各自计数）
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// 重试退避基准（毫秒），按尝试次数指数增长
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    /// 重试退避上限（毫秒）
    #[serde(default = "default_retry_max_ms")]
    pub retry_max_ms: u64,

    /// 任务状态轮询间隔（毫秒）
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Processing 状态的超时上限（秒），超过则任务置为 Failed(Timeout)
    #[serde(default = "default_processing_timeout")]
    pub processing_timeout_secs: u64,

    /// 结果保留时间（秒），超过后 fetch_result 返回 ResultExpired
    #[serde(default = "default_result_retention")]
    pub result_retention_secs: u64,

    /// 上传 payload 最大大小（字节），默认 10MB
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,

    /// 情感强度 (0.0 - 1.0)，透传给克隆服务
    #[serde(default = "default_exaggeration")]
    pub exaggeration: f32,

    /// 是否使用 Fake 客户端（离线演示，不调用真实服务）
    #[serde(default)]
    pub fake: bool,
}

fn default_cloning_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_cloning_timeout() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_ms() -> u64 {
    500
}

fn default_retry_max_ms() -> u64 {
    8000
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_processing_timeout() -> u64 {
    180
}

fn default_result_retention() -> u64 {
    300
}

fn default_max_upload_size() -> u64 {
    10 * 1024 * 1024 // 10 MB
}

fn default_exaggeration() -> f32 {
    0.5
}

impl Default for CloningConfig {
    fn default() -> Self {
        Self {
            url: default_cloning_url(),
            timeout_secs: default_cloning_timeout(),
            max_retries: default_max_retries(),
            retry_base_ms: default_retry_base_ms(),
            retry_max_ms: default_retry_max_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            processing_timeout_secs: default_processing_timeout(),
            result_retention_secs: default_result_retention(),
            max_upload_size: default_max_upload_size(),
            exaggeration: default_exaggeration(),
            fake: false,
        }
    }
}

/// 麦克风采集配置
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// 最短采样时长（秒），不足则 stop_recording 返回 TooShort
    #[serde(default = "default_min_duration")]
    pub min_duration_secs: f32,

    /// 最长采样时长（秒），超出部分截断
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
}

fn default_min_duration() -> f32 {
    5.0
}

fn default_max_duration() -> f32 {
    15.0
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: default_min_duration(),
            max_duration_secs: default_max_duration(),
        }
    }
}

/// 播放配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// 播放进度通知间隔（毫秒）
    #[serde(default = "default_position_interval_ms")]
    pub position_interval_ms: u64,
}

fn default_position_interval_ms() -> u64 {
    250
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            position_interval_ms: default_position_interval_ms(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

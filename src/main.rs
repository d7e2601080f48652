//! Tail a Tale - 用自己的声音给孩子讲故事
//!
//! 演示流程: 录一段声音样本 → 选一个内置故事 → 提交声音克隆服务 →
//! 跟踪任务状态 → 播放合成的朗读音频

use std::sync::Arc;

use tailtale::application::ports::{AudioCapturePort, CloningEnginePort};
use tailtale::application::{NarrationConfig, NarrationController, PlaybackManager};
use tailtale::config::{load_config, print_config};
use tailtale::domain::narration::JobState;
use tailtale::domain::story::{StoryCatalog, StoryId};
use tailtale::infrastructure::capture::CpalAudioCapture;
use tailtale::infrastructure::cloning::{
    FakeCloningClient, HttpCloningClient, HttpCloningClientConfig,
};
use tailtale::infrastructure::playback::RodioOutput;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!("{},tailtale={}", config.log.level, config.log.level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Tail a Tale - 声音克隆讲故事流水线");
    print_config(&config);

    let catalog = Arc::new(StoryCatalog::builtin());

    // 不带参数时列出可用故事
    let Some(slug) = std::env::args().nth(1) else {
        println!("Usage: tailtale <story-slug>");
        println!();
        println!("Available stories:");
        for summary in catalog.list() {
            println!(
                "  {:<20} {} ({} paragraphs)",
                summary.id.to_string(),
                summary.title,
                summary.paragraph_count
            );
        }
        return Ok(());
    };
    let story_id = StoryId::new(slug.as_str());

    // 创建克隆引擎（fake 模式用于离线演示）
    let engine: Arc<dyn CloningEnginePort> = if config.cloning.fake {
        tracing::warn!("Using fake cloning client, no real synthesis happens");
        Arc::new(FakeCloningClient::new())
    } else {
        let client = HttpCloningClient::new(HttpCloningClientConfig::from(&config.cloning))
            .map_err(|e| anyhow::anyhow!("Failed to create cloning client: {}", e))?;
        if !client.health_check().await {
            tracing::warn!(url = %config.cloning.url, "Cloning service health check failed");
        }
        Arc::new(client)
    };

    // 录制声音样本
    let capture = CpalAudioCapture::new(config.capture.clone());
    println!(
        "Recording a voice sample ({:.0}-{:.0}s). Read a few sentences aloud, then press Enter.",
        config.capture.min_duration_secs, config.capture.max_duration_secs
    );
    capture
        .start_recording()
        .await
        .map_err(|e| anyhow::anyhow!("Recording failed: {}", e))?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;

    let sample = capture
        .stop_recording()
        .await
        .map_err(|e| anyhow::anyhow!("Recording failed: {}", e))?;
    println!("Captured {:.1}s of audio.", sample.duration_secs());

    // 启动朗读任务并跟踪状态直到终态
    let controller = NarrationController::new(
        catalog,
        engine,
        NarrationConfig::from(&config.cloning),
    );
    let mut rx = controller.subscribe();
    controller
        .begin(Some(sample), &story_id)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let snapshot = loop {
        {
            let snapshot = rx.borrow_and_update().clone();
            if snapshot.is_terminal() {
                break snapshot;
            }
            println!("  [{}]", snapshot.state.as_str());
        }
        rx.changed().await?;
    };

    if snapshot.state != JobState::Succeeded {
        match snapshot.failure {
            Some(reason) => anyhow::bail!("Narration {}: {}", snapshot.state.as_str(), reason),
            None => anyhow::bail!("Narration {}", snapshot.state.as_str()),
        }
    }
    let result = snapshot
        .result
        .ok_or_else(|| anyhow::anyhow!("Succeeded job carries no result"))?;

    // 播放合成的朗读音频
    let manager = PlaybackManager::new(Arc::new(RodioOutput::new()), &config.playback);
    manager
        .load(&result)
        .await
        .map_err(|e| anyhow::anyhow!("Playback failed: {}", e))?;
    manager
        .play()
        .await
        .map_err(|e| anyhow::anyhow!("Playback failed: {}", e))?;
    println!(
        "Playing \"{}\" ({:.0}s). Press Ctrl-C to stop.",
        story_id,
        result.duration_secs()
    );

    let mut position_rx = manager.subscribe_position();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received shutdown signal");
                break;
            }
            changed = position_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let position = position_rx.borrow().clone();
                if position.finished {
                    println!("Done.");
                    break;
                }
            }
        }
    }
    let _ = manager.stop().await;

    Ok(())
}

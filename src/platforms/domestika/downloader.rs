use std::path::PathBuf;
use std::sync::Arc;

use domestika_core::fs_paths::{save_name, CoursePaths};
use domestika_core::models::course::VideoDescriptor;
use domestika_core::models::settings::Settings;

use crate::core::debug_log::DebugLog;
use crate::core::filename::sanitize_path_component;
use crate::core::m3u8dl::{subtitle_args, video_args};
use crate::platforms::traits::MediaTool;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub output_dir: PathBuf,
    pub max_height: u32,
    pub video_codec: String,
    pub subtitle_lang: String,
    pub subtitle_format: String,
}

impl FetchSettings {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            output_dir: settings.output_dir.clone(),
            max_height: settings.download.max_height,
            video_codec: settings.download.video_codec.clone(),
            subtitle_lang: settings.download.subtitle_lang.clone(),
            subtitle_format: settings.download.subtitle_format.clone(),
        }
    }
}

pub struct VideoFetcher {
    tool: Arc<dyn MediaTool>,
    settings: FetchSettings,
    debug_log: Option<DebugLog>,
}

impl VideoFetcher {
    pub fn new(tool: Arc<dyn MediaTool>, settings: FetchSettings, debug_log: Option<DebugLog>) -> Self {
        Self {
            tool,
            settings,
            debug_log,
        }
    }

    /// Video stream first, then the subtitle track, into the same folder under
    /// the same save-name.
    pub async fn download(
        &self,
        video: &VideoDescriptor,
        course_title: &str,
        unit_title: &str,
        index: usize,
    ) -> anyhow::Result<()> {
        let dir = CoursePaths::new(&self.settings.output_dir, course_title)
            .unit_dir(&video.section, unit_title);
        tokio::fs::create_dir_all(&dir).await?;

        let name = save_name(index, &sanitize_path_component(video.title.trim_end()));

        let video_out = self
            .tool
            .run(&video_args(
                &video.playback_url,
                self.settings.max_height,
                &self.settings.video_codec,
                &dir,
                &name,
            ))
            .await?;

        let subs_out = self
            .tool
            .run(&subtitle_args(
                &video.playback_url,
                &self.settings.subtitle_lang,
                &self.settings.subtitle_format,
                &dir,
                &name,
            ))
            .await?;

        if let Some(log) = &self.debug_log {
            log.push(&video.playback_url, vec![video_out, subs_out]);
        }

        tracing::info!("[domestika] downloaded {}", dir.join(&name).display());
        Ok(())
    }
}

//! Completion sound players

use std::{io::Write, sync::Arc};

use tokio::{process::Command, runtime::Handle};
use tracing::{debug, info, warn};

/// Fire-and-forget sound played when the countdown finishes
pub trait SoundPlayer: Send + Sync {
    fn play(&self);
}

/// Rings the terminal bell
#[derive(Debug, Default, Clone)]
pub struct BellSoundPlayer;

impl SoundPlayer for BellSoundPlayer {
    fn play(&self) {
        let mut stdout = std::io::stdout();
        if let Err(e) = stdout.write_all(b"\x07").and_then(|_| stdout.flush()) {
            warn!("Failed to ring terminal bell: {}", e);
        }
    }
}

/// Plays a sound by running an external command, e.g. `paplay done.oga`
#[derive(Debug, Clone)]
pub struct CommandSoundPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandSoundPlayer {
    /// Build from a whitespace separated command line
    pub fn from_command_line(command_line: &str) -> Result<Self, String> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| "Sound command is empty".to_string())?;

        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl SoundPlayer for CommandSoundPlayer {
    fn play(&self) {
        let Ok(handle) = Handle::try_current() else {
            warn!("No async runtime available, falling back to terminal bell");
            BellSoundPlayer.play();
            return;
        };

        let program = self.program.clone();
        let args = self.args.clone();
        handle.spawn(async move {
            debug!("Playing completion sound with {}", program);
            match Command::new(&program).args(&args).output().await {
                Ok(output) if output.status.success() => info!("Completion sound played"),
                Ok(output) => {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    warn!("Sound command {} failed: {}", program, stderr.trim());
                }
                Err(e) => warn!("Failed to execute sound command {}: {}", program, e),
            }
        });
    }
}

/// Pick the player for an optional configured command line
pub fn sound_player_for(command_line: Option<&str>) -> Result<Arc<dyn SoundPlayer>, String> {
    match command_line {
        Some(line) => Ok(Arc::new(CommandSoundPlayer::from_command_line(line)?)),
        None => Ok(Arc::new(BellSoundPlayer)),
    }
}

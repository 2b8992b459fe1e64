//! Inbound payload dispatch.
//!
//! Every decoded payload takes exactly one of three routes: a `ping` earns
//! a `pong` reply, a `command` becomes at most one playback call, and
//! everything else is dropped. Command failures are logged and swallowed;
//! the companion gets no acknowledgment either way.

use tracing::{debug, warn};

use aria_player::PlayerControl;
use aria_protocol::{Command, Payload};

/// Handle one inbound payload, returning the reply to send, if any.
pub async fn dispatch(payload: Payload, control: Option<&dyn PlayerControl>) -> Option<Payload> {
    match payload {
        Payload::Ping => Some(Payload::Pong),
        Payload::Command(command) => {
            run_command(command, control).await;
            None
        }
        // Host-to-companion payloads and unknown tags are not ours to act on.
        Payload::Initialize | Payload::Pong | Payload::State(_) | Payload::Unknown => None,
    }
}

/// Execute a playback command against the backend, if one is attached.
async fn run_command(command: Command, control: Option<&dyn PlayerControl>) {
    let Some(control) = control else {
        debug!(?command, "no playback backend attached, command dropped");
        return;
    };

    let result = match command {
        Command::Pause => control.pause().await,
        Command::Resume => control.resume().await,
        Command::ForwardSong => control.next_track().await,
        Command::BackwardSong => control.previous_track().await,
        Command::SetVolume { volume } => control.set_volume(volume).await,
        Command::SeekPlayProgress { progress } => control.seek_to(progress).await,
        Command::Unknown => return,
    };

    if let Err(e) = result {
        warn!(error = %e, "playback command failed");
    }
}

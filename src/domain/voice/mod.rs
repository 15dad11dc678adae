//! Voice resource domain module

mod command;
mod message;
mod resource;
mod route;
mod state;

pub use command::{BridgeCommand, BridgeReply, BridgeRequest, CommandParseError, PlaybackOptions};
pub use message::{EventValue, MsgType, VoiceEvent};
pub use resource::{is_remote, strip_file_protocol, ResolvedResource, ResourceResolver, ResourceUrl};
pub use route::OutputRoute;
pub use state::{InvalidStateTransition, PlaybackSession, VoiceState};

// Messaging - Lock-free channels between the UI and the sequencer thread

pub mod channels;
pub mod command;
pub mod notification;

pub use channels::{
    CommandConsumer, CommandProducer, EventConsumer, EventProducer, create_command_channel,
    create_event_channel,
};
pub use command::Command;
pub use notification::{Notification, NotificationCategory, NotificationLevel, SequencerEvent};

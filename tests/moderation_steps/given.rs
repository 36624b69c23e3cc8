//! Given steps for moderation BDD scenarios.

use super::world::{ModerationWorld, run_async};
use chatstore::chat::domain::{NewChatMessage, SenderId, StreamId};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given(r#"a message "{text}" from "{sender}" in stream "{stream}""#)]
fn message_in_stream(
    world: &mut ModerationWorld,
    text: String,
    sender: String,
    stream: String,
) -> Result<(), eyre::Report> {
    let stream_id = StreamId::new(stream).wrap_err("construct stream id")?;
    let sender_id = SenderId::new(sender).wrap_err("construct sender id")?;
    let created = run_async(
        world
            .service
            .create(NewChatMessage::new(stream_id.clone(), sender_id, text)),
    )
    .wrap_err("create scenario message")?;

    world.stream = Some(stream_id);
    world.message = Some(created);
    Ok(())
}

#[given(r#"no message exists in stream "{stream}""#)]
fn empty_stream(world: &mut ModerationWorld, stream: String) -> Result<(), eyre::Report> {
    world.stream = Some(StreamId::new(stream).wrap_err("construct stream id")?);
    Ok(())
}

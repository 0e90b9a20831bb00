use crate::args::ChatArgs;
use crate::chat::{ChatMode, ChatRelay, ChatSlot};
use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

const QUIT: &str = "/quit";

/// Sends one message and prints the reply, or reads messages from stdin until it closes or the
/// user types `/quit`.
pub async fn chat(config: Config, mode: ChatMode, args: ChatArgs) -> Result<Out<()>> {
    let mut relay = ChatRelay::from_config(&config, mode).await?;
    match args.message() {
        Some(message) => {
            let reply = relay.send(message).await?;
            Ok(reply.into())
        }
        None => {
            println!("Chat with the budget assistant. Type {QUIT} or press Ctrl-D to leave.");
            let turns = repl(relay, BufReader::new(tokio::io::stdin()), |line| {
                println!("{line}")
            })
            .await?;
            debug!("The chat ended after {turns} replies");
            Ok(Out::new_message(""))
        }
    }
}

/// Reads lines from `input` and hands each non-empty one to a `ChatSlot`. Lines that arrive while
/// a reply is pending are refused. When `input` closes, the pending reply is still awaited.
/// Returns the number of successful replies.
async fn repl<R, F>(relay: ChatRelay, input: R, mut print: F) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    F: FnMut(&str),
{
    let (mut slot, mut replies) = ChatSlot::new(relay);
    let mut lines = input.lines();
    let mut input_open = true;
    let mut turns = 0;

    loop {
        if !input_open && !slot.is_busy() {
            break;
        }
        tokio::select! {
            line = lines.next_line(), if input_open => {
                let Some(line) = line.context("Unable to read from stdin")? else {
                    input_open = false;
                    continue;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == QUIT {
                    break;
                }
                if let Err(e) = slot.dispatch(line) {
                    print(&format!("{e}"));
                }
            }
            Some(completed) = replies.recv() => {
                match slot.complete(completed) {
                    Ok(reply) => {
                        turns += 1;
                        print(&format!("Assistant: {reply}"));
                    }
                    Err(e) => {
                        warn!("The chat request failed: {e:#}");
                        print(&format!("Error: {e:#}"));
                    }
                }
            }
            else => break,
        }
    }
    Ok(turns)
}

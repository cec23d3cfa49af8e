//! A chat room on stdin.
//!
//! Each line is one chat message. A line may start with `#channel` and/or
//! `@user` to switch who is talking and where; both stick until changed.

use std::fs;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use game_core::prelude::*;

use crate::preview;

/// One parsed line of console input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChatLine<'a> {
    pub channel: Option<&'a str>,
    pub user: Option<&'a str>,
    pub text: &'a str,
}

impl<'a> ChatLine<'a> {
    pub fn parse(line: &'a str) -> Self {
        let mut chat = ChatLine {
            channel: None,
            user: None,
            text: line.trim(),
        };
        loop {
            let (head, rest) = chat
                .text
                .split_once(char::is_whitespace)
                .unwrap_or((chat.text, ""));
            if let Some(channel) = head.strip_prefix('#').filter(|c| !c.is_empty()) {
                chat.channel = Some(channel);
            } else if let Some(user) = head.strip_prefix('@').filter(|u| !u.is_empty()) {
                chat.user = Some(user);
            } else {
                return chat;
            }
            chat.text = rest.trim_start();
        }
    }
}

#[derive(Debug)]
pub struct ConsoleOptions {
    pub channel: String,
    pub user: String,
    /// Where rendered grids are written, if anywhere.
    pub out_dir: Option<PathBuf>,
    pub preview: bool,
}

/// Feeds console lines to the game and prints what it answers.
#[derive(Debug)]
pub struct Console<'g, S, R> {
    game: &'g SeeColor<S, R>,
    options: ConsoleOptions,
    images_written: usize,
}

impl<'g, S: Store, R: Renderer> Console<'g, S, R> {
    pub fn new(game: &'g SeeColor<S, R>, options: ConsoleOptions) -> Self {
        Console {
            game,
            options,
            images_written: 0,
        }
    }

    /// Handles lines until `input` runs dry. `now` supplies each message's
    /// timestamp in milliseconds.
    pub fn run<I: BufRead, W: Write>(
        &mut self,
        input: I,
        output: &mut W,
        mut now: impl FnMut() -> u64,
    ) -> anyhow::Result<()> {
        for line in input.lines() {
            let line = line.context("reading console input")?;
            self.handle_line(&line, now(), output)?;
        }
        Ok(())
    }

    pub fn handle_line<W: Write>(
        &mut self,
        line: &str,
        timestamp: u64,
        output: &mut W,
    ) -> anyhow::Result<()> {
        let chat = ChatLine::parse(line);
        if let Some(channel) = chat.channel {
            self.options.channel = channel.to_string();
        }
        if let Some(user) = chat.user {
            self.options.user = user.to_string();
        }
        if chat.text.is_empty() {
            return Ok(());
        }
        let invocation = Invocation::new(
            &self.options.channel,
            &self.options.user,
            &self.options.user,
            timestamp,
        );
        let outcome = match self.game.handle_message(&invocation, chat.text) {
            Ok(outcome) => outcome,
            Err(err) => {
                log::error!("Message [{}] failed: {err}", chat.text);
                writeln!(output, "[#{}] error: {err}", self.options.channel)?;
                return Ok(());
            },
        };
        let Some(reply) = outcome.reply else {
            return Ok(());
        };
        writeln!(output, "[#{}] @{}: {reply}", self.options.channel, self.options.user)?;
        if let Some(picture) = reply.picture() {
            if self.options.preview {
                preview::draw_round(output, &picture.round())?;
            }
            if let Some(path) = self.save_image(picture)? {
                writeln!(output, "(grid saved to {})", path.display())?;
            }
        }
        Ok(())
    }

    fn save_image(&mut self, picture: &RoundPicture) -> anyhow::Result<Option<PathBuf>> {
        let Some(dir) = &self.options.out_dir else {
            return Ok(None);
        };
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        self.images_written += 1;
        let image = picture.image();
        let path = dir.join(format!(
            "{}-{:03}-level{}.{}",
            self.options.channel,
            self.images_written,
            picture.round().level(),
            image.format.extension()
        ));
        fs::write(&path, &image.bytes).with_context(|| format!("writing {}", path.display()))?;
        log::debug!("Wrote {} bytes to {path:?}", image.bytes.len());
        Ok(Some(path))
    }
}

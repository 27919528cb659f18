//! Terminal front end: turns typed commands into page events and writes the
//! page snapshot after each one.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::page::Page;
use crate::view::FormField;

const HELP: &str = "Commands: create, refresh, merge, help, quit";

pub async fn run<R, W>(page: &Page, input: R, mut output: W, snapshot: &Path) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    write_snapshot(page, snapshot).await?;
    say(&mut output, HELP).await?;

    'commands: loop {
        output.write_all(b"> ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await.context("Failed to read command")? else {
            break;
        };

        match line.trim() {
            "" => continue,
            "create" => {
                for field in FormField::ALL {
                    output.write_all(format!("{}: ", field.name()).as_bytes()).await?;
                    output.flush().await?;
                    let Some(value) = lines.next_line().await.context("Failed to read field")? else {
                        break 'commands;
                    };
                    page.html().set_field(field, value);
                }

                if let Some(Ok(submitted)) = page.click_submit().await {
                    // only so the snapshot below shows the refreshed list
                    let _ = submitted.refresh.await;
                }
            }
            "refresh" => {
                let _ = page.refresh().await;
            }
            "merge" => {
                let url = page.click_merge().to_string();
                say(&mut output, &format!("Opening {}", url)).await?;
            }
            "help" => say(&mut output, HELP).await?,
            "quit" | "exit" => break,
            other => say(&mut output, &format!("Unknown command '{}'. {}", other, HELP)).await?,
        }

        if let Some(text) = page.html().notification_text() {
            say(&mut output, &text).await?;
        }
        write_snapshot(page, snapshot).await?;
    }

    // input may end partway through a command
    write_snapshot(page, snapshot).await
}

async fn say<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}

async fn write_snapshot(page: &Page, path: &Path) -> Result<()> {
    tokio::fs::write(path, page.render())
        .await
        .with_context(|| format!("Failed to write page to {}", path.display()))
}

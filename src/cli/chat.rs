use std::io::{self, Write};

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::session::{Session, exchange};

pub async fn run(url: &str) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let client = reqwest::Client::new();
    let mut session = Session::default();

    if let Some(greeting) = session.transcript().last() {
        println!("{}", greeting.content);
    }

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());

                // Print only what is new since the last render. The
                // reply only ever grows so a byte offset is enough.
                let mut printed = 0;
                session = exchange(&client, url, &session, &line, |s| {
                    if let Some(reply) = s.transcript().last() {
                        if reply.content.len() > printed {
                            print!("{}", &reply.content[printed..]);
                            let _ = io::stdout().flush();
                            printed = reply.content.len();
                        }
                    }
                })
                .await?;
                println!();

                if let Some(err) = session.error() {
                    println!("[error: {}]", err);
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

//! navpane terminal demo.
//!
//! Renders navigator documents as text on stdout and reads commands from
//! stdin. The configuration file comes from the first argument, the
//! `NAVPANE_CONFIG` environment variable, or built-in defaults.

mod commands;
mod pages;
mod terminal;

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use navpane_core::{ActivationEvent, EventKind, NavConfig, Navigator, NavigatorBuilder};

use crate::commands::Command;
use crate::terminal::TerminalSurface;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args()
        .nth(1)
        .or_else(|| std::env::var("NAVPANE_CONFIG").ok())
    {
        Some(path) => {
            NavConfig::load(&path).with_context(|| format!("loading configuration {path}"))?
        },
        None => NavConfig::default(),
    };
    log::info!("Starting navpane (home {})", config.home);

    let mut builder = NavigatorBuilder::from_config(&config)
        .register_package(pages::DEMO_PACKAGE, pages::package());
    if config.bundle_dir.is_none() {
        builder = builder.bundle(pages::bundle()?);
    }
    if config.title.is_none() {
        builder = builder.title("navpane");
    }
    let mut nav = builder.build(TerminalSurface::new(io::stdout()))?;

    nav.launch();
    run(&mut nav, io::stdin().lock())?;
    log::info!("Visited {} documents", nav.history().len());
    Ok(())
}

fn run<W: Write>(nav: &mut Navigator<TerminalSurface<W>>, input: impl BufRead) -> Result<()> {
    prompt()?;
    for line in input.lines() {
        let line = line?;
        match commands::parse(&line) {
            None => {},
            Some(Err(msg)) => eprintln!("{msg}"),
            Some(Ok(Command::Quit)) => break,
            Some(Ok(Command::Help)) => eprintln!("{}", commands::HELP),
            Some(Ok(Command::History)) => {
                for (i, doc) in nav.history().iter().enumerate() {
                    eprintln!("{:>3} {}", i + 1, doc.address());
                }
            },
            Some(Ok(Command::Go(link))) => nav.navigate(&link),
            Some(Ok(Command::Follow(n))) => match nav.surface().link(n) {
                Some(href) => {
                    let event = ActivationEvent::for_href(EventKind::Activated, href);
                    nav.activate(&event);
                },
                None => eprintln!("no link [{n}]"),
            },
            Some(Ok(Command::Submit(n, data))) => match nav.surface().form(n) {
                Some(form) => {
                    let query = ActivationEvent::for_href(EventKind::Activated, &form.action).query;
                    nav.activate(&ActivationEvent::submitted(query, data));
                },
                None => eprintln!("no form {{{n}}}"),
            },
        }
        prompt()?;
    }
    Ok(())
}

fn prompt() -> Result<()> {
    let mut err = io::stderr();
    write!(err, "> ")?;
    err.flush()?;
    Ok(())
}

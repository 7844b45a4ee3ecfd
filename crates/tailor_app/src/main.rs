mod command;
mod config;

use std::{
    collections::VecDeque,
    io::BufRead,
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Context;
use clap::Parser;
use tailor_core::{App, time::FrameClock, tokio::sync::mpsc};
use tailor_scene::{Configurator, ConfiguratorEvent, SelectionState};

use crate::{
    command::{Command, HELP, PartRef},
    config::TailorConfig,
};

/// Load a model, pick a part, try materials on it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML config file (default: ./tailor.toml if present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Model to load, path or URL (.glb / .gltf)
    #[arg(short, long, value_name = "SOURCE")]
    model: Option<String>,

    /// Material catalog to load, path or URL
    #[arg(long, value_name = "SOURCE")]
    catalog: Option<String>,

    /// Read commands from a file instead of stdin
    #[arg(short, long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" }),
    )
    .init();

    let mut config = TailorConfig::resolve(cli.config.as_deref())?;
    if cli.model.is_some() {
        config.model = cli.model.clone();
    }
    if cli.catalog.is_some() {
        config.catalog = cli.catalog.clone();
    }

    let mut app = App::with_io_threads(config.app.io_threads).context("starting the I/O runtime")?;
    let mut configurator = Configurator::new(app.io_pool(), config.metadata.clone());

    if let Some(catalog) = &config.catalog {
        configurator.load_catalog(catalog);
    }
    if let Some(model) = &config.model {
        configurator.load_model(model);
    }

    let mut input = spawn_input(cli.script.as_deref())?;
    let mut queue: VecDeque<String> = VecDeque::new();
    let mut input_closed = false;

    let mut clock = FrameClock::with_frame_budget(Duration::from_millis(config.app.frame_ms.max(1)));
    let load_timeout = Duration::from_millis(config.app.load_timeout_ms);
    let mut loading_since: Option<Instant> = None;

    if cli.script.is_none() {
        println!("{HELP}");
    }

    while app.running {
        clock.tick();
        if clock.delta_seconds() > 0.25 {
            log::debug!("[Host] Slow frame: {:.0} ms", clock.delta_seconds() * 1000.0);
        }

        for event in configurator.flush() {
            print_event(&event);
        }

        loop {
            match input.try_recv() {
                Ok(line) => queue.push_back(line),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    input_closed = true;
                    break;
                }
            }
        }

        // Commands wait for pending loads, up to the timeout
        let blocked = if configurator.is_loading() {
            let since = *loading_since.get_or_insert_with(Instant::now);
            if since.elapsed() < load_timeout {
                true
            } else {
                log::warn!(
                    "[Host] Still loading after {} ms, running queued commands anyway",
                    load_timeout.as_millis()
                );
                loading_since = None;
                false
            }
        } else {
            loading_since = None;
            false
        };

        while !blocked && app.running {
            let Some(line) = queue.pop_front() else {
                break;
            };
            match Command::parse(&line) {
                Ok(Some(command)) => run(command, &mut configurator, &mut app),
                Ok(None) => {}
                Err(message) => println!("{message}"),
            }
            // A load just started, let it land before the next command
            if configurator.is_loading() {
                break;
            }
        }

        if input_closed && queue.is_empty() && !configurator.is_loading() {
            app.stop();
        }

        clock.sleep_until_next_frame();
    }

    log::info!("[Host] Bye after {:.1}s", clock.elapsed().as_secs_f32());
    Ok(())
}

fn spawn_input(script: Option<&std::path::Path>) -> anyhow::Result<mpsc::UnboundedReceiver<String>> {
    let (sender, receiver) = mpsc::unbounded_channel();

    let reader: Box<dyn BufRead + Send> = match script {
        Some(path) => Box::new(std::io::BufReader::new(
            std::fs::File::open(path).with_context(|| format!("opening script {}", path.display()))?,
        )),
        None => Box::new(std::io::BufReader::new(std::io::stdin())),
    };

    std::thread::Builder::new()
        .name("tailor-input".into())
        .spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else {
                    break;
                };
                if sender.send(line).is_err() {
                    break;
                }
            }
        })
        .context("spawning the input thread")?;

    Ok(receiver)
}

fn run(command: Command, configurator: &mut Configurator, app: &mut App) {
    match command {
        Command::Parts => print_parts(configurator),
        Command::Part(part) => {
            let parts = configurator.parts();
            let name = match part {
                PartRef::Name(name) => name,
                PartRef::Position(n) => match parts.part_at(n - 1) {
                    Some(part) => part.name().to_string(),
                    None => {
                        println!("there is no part #{n}");
                        return;
                    }
                },
            };
            match configurator.select_part(&name) {
                Ok(()) => print_variants(configurator, &name),
                Err(e) => println!("{e}"),
            }
        }
        Command::Material(n) => match configurator.select_material_at(n - 1) {
            Ok(count) => println!("applied to {count} mesh(es)"),
            Err(e) => println!("{e}"),
        },
        Command::Catalog(source) => {
            configurator.load_catalog(&source);
            println!("loading catalog {source}");
        }
        Command::Model(source) => {
            configurator.load_model(&source);
            println!("loading model {source}");
        }
        Command::Status => print_status(configurator),
        Command::Help => println!("{HELP}"),
        Command::Quit => app.stop(),
    }
}

fn print_event(event: &ConfiguratorEvent) {
    match event {
        ConfiguratorEvent::SceneReplaced { source, parts } => {
            println!("model {source}: {parts} part(s), type 'parts' to list them")
        }
        ConfiguratorEvent::SceneFailed { source, error } => {
            println!("model {source} failed: {error}")
        }
        ConfiguratorEvent::CatalogUpdated {
            source, materials, ..
        } => println!("catalog {source}: {materials} material(s)"),
        ConfiguratorEvent::CatalogFailed { source, error } => {
            println!("catalog {source} failed, using scene materials only: {error}")
        }
        ConfiguratorEvent::StaleDiscarded { .. } => {}
    }
}

fn print_parts(configurator: &Configurator) {
    let parts = configurator.parts();
    if parts.is_empty() {
        println!("no parts");
        return;
    }
    let selected = configurator.selection().selected_part();
    for (position, part) in parts.iter().enumerate() {
        let marker = if selected == Some(part.name()) { '*' } else { ' ' };
        println!(
            "{marker} #{} {} ({} material(s))",
            position + 1,
            part.display_name(position),
            part.variants().len()
        );
    }
}

fn print_variants(configurator: &Configurator, name: &str) {
    let parts = configurator.parts();
    let Some(part) = parts.get(name) else {
        return;
    };
    let applied = configurator.selection().selected_material();
    for (index, material) in part.variants().iter().enumerate() {
        let marker = if applied == Some(material) { '*' } else { ' ' };
        println!("{marker} {:>2}. {} {}", index + 1, material.swatch(), material.name());
    }
}

fn print_status(configurator: &Configurator) {
    match configurator.scene() {
        Some(scene) => println!(
            "scene {} (generation {}), {} node(s)",
            scene.id().get(),
            configurator.scene_generation(),
            scene.len()
        ),
        None => println!("no scene"),
    }
    println!(
        "catalog epoch {}, {} material(s)",
        configurator.catalog().epoch(),
        configurator.catalog().catalog().len()
    );
    let parts = configurator.parts();
    println!("{} part(s), {} skipped variant(s)", parts.len(), parts.skipped().len());
    match configurator.selection() {
        SelectionState::Idle => println!("nothing selected"),
        SelectionState::PartSelected { part } => println!("part '{part}' selected"),
        SelectionState::MaterialApplied { part, material } => {
            println!("part '{part}' wears {} {}", material.swatch(), material.name())
        }
    }
    if configurator.is_loading() {
        println!("loading...");
    }
}

mod bot;
mod config;
mod session;

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::time::{self, Instant, MissedTickBehavior};

use config::SessionConfig;
use dashfire::FixedTimestep;
use session::Session;

#[derive(Parser)]
#[command(name = "dashfire-server")]
#[command(about = "Headless dashfire session host")]
struct Args {
    #[arg(short, long, help = "RON session config; flags below override it")]
    config: Option<PathBuf>,

    #[arg(short, long)]
    participants: Option<u32>,

    #[arg(short, long)]
    tick_rate: Option<u32>,

    #[arg(short, long)]
    send_rate: Option<u32>,

    #[arg(long, help = "Ticks to run; 0 runs until Ctrl-C")]
    ticks: Option<u64>,

    #[arg(long, help = "Pace ticks to wall-clock time")]
    realtime: bool,

    #[arg(long, help = "Packet loss percentage (0-100)")]
    loss_percent: Option<f32>,

    #[arg(long, help = "Packet duplication percentage (0-100)")]
    duplicate_percent: Option<f32>,

    #[arg(long, help = "Packet reorder percentage (0-100)")]
    reorder_percent: Option<f32>,

    #[arg(long, help = "Minimum link delay in ticks")]
    min_delay: Option<u32>,

    #[arg(long, help = "Maximum link delay in ticks")]
    max_delay: Option<u32>,

    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn session_config(&self) -> Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::load(path)?,
            None => SessionConfig::default(),
        };

        if let Some(participants) = self.participants {
            config.participants = participants;
        }
        if let Some(tick_rate) = self.tick_rate {
            config.simulation.tick_rate = tick_rate;
        }
        if let Some(send_rate) = self.send_rate {
            config.simulation.replication.send_rate = send_rate;
        }
        if let Some(ticks) = self.ticks {
            config.ticks = ticks;
        }
        if let Some(loss) = self.loss_percent {
            config.link.loss_percent = loss;
        }
        if let Some(duplicate) = self.duplicate_percent {
            config.link.duplicate_percent = duplicate;
        }
        if let Some(reorder) = self.reorder_percent {
            config.link.reorder_percent = reorder;
        }
        if let Some(min_delay) = self.min_delay {
            config.link.min_delay_ticks = min_delay;
        }
        if let Some(max_delay) = self.max_delay {
            config.link.max_delay_ticks = max_delay;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
            config.link.seed = seed;
        }
        config.realtime |= self.realtime;

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().session_config()?;
    log::info!(
        "starting session: {} participants at {} Hz, link {:?}",
        config.participants,
        config.simulation.tick_rate,
        config.link
    );

    let realtime = config.realtime;
    let tick_rate = config.simulation.tick_rate;
    let mut session = Session::new(config);

    let running = session.running();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("interrupted, shutting down");
            running.store(false, Ordering::SeqCst);
        }
    });

    if realtime {
        run_realtime(&mut session, tick_rate).await;
    } else {
        while session.is_running() {
            session.tick_once();
            if session.tick_count() % 256 == 0 {
                tokio::task::yield_now().await;
            }
        }
    }

    session.shutdown();
    log::info!("session ended after {} ticks", session.tick_count());
    for report in session.reports() {
        log::info!(
            "participant {}: kills {} deaths {} | snapshots sent {} applied {} stale {} | \
             damage sent {} applied {} duplicates {} | link sent {} dropped {} ({:.1}% loss)",
            report.participant.0,
            report.kills,
            report.deaths,
            report.replica.snapshots_sent,
            report.replica.snapshots_applied,
            report.replica.snapshots_stale,
            report.replica.damage_sent,
            report.replica.damage_applied,
            report.replica.damage_duplicates,
            report.link.packets_sent,
            report.link.packets_dropped,
            report.link.loss_percent(),
        );
    }

    Ok(())
}

async fn run_realtime(session: &mut Session, tick_rate: u32) {
    let mut timestep = FixedTimestep::new(tick_rate);
    let mut interval = time::interval(Duration::from_secs_f32(timestep.dt()));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last = Instant::now();

    while session.is_running() {
        let now = interval.tick().await;
        timestep.accumulate((now - last).as_secs_f32());
        last = now;

        while session.is_running() && timestep.consume_tick() {
            session.tick_once();
        }
    }
}

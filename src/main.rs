use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use stopwatch::logging::{init_logging, LoggingConfig};
use stopwatch::{FileStore, HostConfig, Stopwatch, StopwatchObserver, SystemClock};

const APP_NAME: &str = "Stopwatch";

#[derive(Debug)]
enum AppOp {
    Command(String),
    Pump,
    Quit,
}

#[derive(Debug)]
enum PumpOp {
    Start(Duration),
    Stop,
    Quit,
}

/// Renders the face on one terminal line.
struct ConsoleFace {
    minutes: String,
    seconds: String,
    hundredths: String,
    lap: String,
}

impl ConsoleFace {
    fn new() -> Self {
        Self {
            minutes: "00".into(),
            seconds: "00".into(),
            hundredths: "00".into(),
            lap: "00:00.00".into(),
        }
    }

    fn render(&self) {
        let mut out = io::stdout().lock();
        write!(
            out,
            "\r{}:{}.{}   lap {}  ",
            self.minutes, self.seconds, self.hundredths, self.lap
        )
        .ok();
        out.flush().ok();
    }
}

impl StopwatchObserver for ConsoleFace {
    fn minutes_did_change(&mut self, value: &str) {
        self.minutes = value.to_owned();
    }

    fn seconds_did_change(&mut self, value: &str) {
        self.seconds = value.to_owned();
    }

    fn hundredths_did_change(&mut self, value: &str) {
        self.hundredths = value.to_owned();
        self.render();
    }

    fn lap_time_did_change(&mut self, value: &str) {
        self.lap = value.to_owned();
        self.render();
    }
}

struct StopwatchApp {
    stopwatch: Stopwatch,
    store: FileStore,
    config: HostConfig,
    pump_tx: Sender<PumpOp>,
    pump_running: bool,
}

impl StopwatchApp {
    fn new(config: HostConfig, pump_tx: Sender<PumpOp>) -> Self {
        let store = FileStore::new(&config.state_path);
        let mut stopwatch = Stopwatch::load_or_default(&store, SystemClock, config.engine.clone());
        stopwatch.subscribe(Box::new(ConsoleFace::new()));
        stopwatch.refresh();

        Self {
            stopwatch,
            store,
            config,
            pump_tx,
            pump_running: false,
        }
    }

    fn start_pump(&mut self) {
        if !self.pump_running && self.stopwatch.wants_ticks() {
            self.pump_running = true;
            self.pump_tx.send(PumpOp::Start(self.config.tick_interval)).ok();
        }
    }

    fn stop_pump(&mut self) {
        if self.pump_running {
            self.pump_running = false;
            self.pump_tx.send(PumpOp::Stop).ok();
        }
    }

    fn persist(&self) {
        // Errors are logged by the engine; the session carries on in memory.
        self.stopwatch.save(&self.store).ok();
    }

    fn handle_pump(&mut self) {
        if !self.stopwatch.wants_ticks() {
            self.stop_pump();
            return;
        }
        self.stopwatch.tick();
        if !self.stopwatch.wants_ticks() {
            self.stop_pump();
        }
    }

    /// `s` toggles start/stop, `l` records a lap or resets when stopped.
    fn handle_command(&mut self, command: &str) {
        match command {
            "s" => {
                if self.stopwatch.is_running() {
                    self.stopwatch.pause();
                    self.stop_pump();
                } else {
                    self.stopwatch.start();
                    self.start_pump();
                }
                self.persist();
            }
            "l" => {
                if self.stopwatch.is_running() {
                    if let Some(lap) = self.stopwatch.record_lap() {
                        println!("\nLap {}  {}", self.stopwatch.lap_count(), lap);
                    }
                } else if let Err(e) = self.stopwatch.reset() {
                    log::error!("{}", e);
                }
                self.persist();
            }
            "" => {}
            other => log::warn!("unknown command {:?}; use s, l or q", other),
        }
    }
}

fn pump_thread(control: Receiver<PumpOp>, main_tx: Sender<AppOp>) {
    let mut interval: Option<Duration> = None;

    loop {
        let op = match interval {
            Some(every) => {
                thread::sleep(every);
                if main_tx.send(AppOp::Pump).is_err() {
                    break;
                }
                match control.try_recv() {
                    Ok(op) => Some(op),
                    Err(TryRecvError::Empty) => None,
                    Err(TryRecvError::Disconnected) => break,
                }
            }
            // Block-wait when stopped
            None => match control.recv() {
                Ok(op) => Some(op),
                Err(_) => break,
            },
        };

        match op {
            Some(PumpOp::Start(every)) => interval = Some(every),
            Some(PumpOp::Stop) => interval = None,
            Some(PumpOp::Quit) => break,
            None => {}
        }
    }
}

fn input_thread(main_tx: Sender<AppOp>) {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let command = line.trim().to_lowercase();
        let op = if command == "q" {
            AppOp::Quit
        } else {
            AppOp::Command(command)
        };
        let quit = matches!(op, AppOp::Quit);
        if main_tx.send(op).is_err() || quit {
            return;
        }
    }
    main_tx.send(AppOp::Quit).ok();
}

fn main() {
    init_logging(LoggingConfig::from_env());
    let config = HostConfig::from_env();
    log::info!("{} state file is {}", APP_NAME, config.state_path.display());

    let (main_tx, main_rx) = mpsc::channel();
    let (pump_tx, pump_rx) = mpsc::channel();

    let pump_main_tx = main_tx.clone();
    let pump = thread::spawn(move || pump_thread(pump_rx, pump_main_tx));
    thread::spawn(move || input_thread(main_tx));

    let mut app = StopwatchApp::new(config, pump_tx);
    println!("s = start/stop, l = lap/reset, q = quit");
    app.start_pump();

    while let Ok(op) = main_rx.recv() {
        match op {
            AppOp::Pump => app.handle_pump(),
            AppOp::Command(command) => app.handle_command(&command),
            AppOp::Quit => break,
        }
    }

    // Clean up
    app.stop_pump();
    app.pump_tx.send(PumpOp::Quit).ok();
    app.persist();
    pump.join().ok();
    println!();
}

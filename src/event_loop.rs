use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};

/// Source of terminal input events.
pub trait InputDriver {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool>;
    fn read(&mut self) -> io::Result<Event>;
}

impl<T: InputDriver + ?Sized> InputDriver for &mut T {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        (**self).poll(timeout)
    }

    fn read(&mut self) -> io::Result<Event> {
        (**self).read()
    }
}

/// Reads events from the real terminal through crossterm. Key releases are
/// dropped so hosts that report them do not fire commands twice.
#[derive(Debug, Default)]
pub struct ConsoleDriver;

impl ConsoleDriver {
    pub fn new() -> Self {
        Self
    }
}

impl InputDriver for ConsoleDriver {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        event::poll(timeout)
    }

    fn read(&mut self) -> io::Result<Event> {
        loop {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Release => continue,
                other => return Ok(other),
            }
        }
    }
}

pub enum ControlFlow {
    Continue,
    Quit,
}

/// Drives the UI thread: polls the driver and hands every event to a handler.
///
/// The handler also runs with `None` once per poll interval, which is where
/// the host redraws and expires pending chord prefixes.
pub struct EventLoop<D> {
    driver: D,
    poll_interval: Duration,
}

impl<D: InputDriver> EventLoop<D> {
    pub fn new(driver: D, poll_interval: Duration) -> Self {
        Self {
            driver,
            poll_interval,
        }
    }

    pub fn driver(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn run<F>(&mut self, mut handler: F) -> io::Result<()>
    where
        F: FnMut(Option<Event>) -> io::Result<ControlFlow>,
    {
        loop {
            if let ControlFlow::Quit = handler(None)? {
                break;
            }

            if self.driver.poll(self.poll_interval)? {
                // Drain bursts (mouse drags, paste) before the next idle tick.
                loop {
                    let event = self.driver.read()?;
                    if let ControlFlow::Quit = handler(Some(event))? {
                        return Ok(());
                    }
                    if !self.driver.poll(Duration::from_millis(0))? {
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}

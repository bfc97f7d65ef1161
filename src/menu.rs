//! Interactive terminal menu.
//!
//! Announcements run in the background once started, so the menu stays
//! usable. Ctrl+C stops running announcements, or exits when idle.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, info};

use crate::error::AnnouncerError;
use crate::selector::parse_page_list;
use crate::service::ScavAnnouncer;

const MENU: &str = "\nScavenger Hunt Announcer Menu:
1. Select items by page numbers
2. Select items by item numbers
3. Select random items
4. Start announcements
5. Preview current selection
6. Announce now
7. Stop announcements
8. Show announcement history
9. Exit";

enum Input {
    Line(String),
    Interrupted,
    Closed,
}

pub struct Menu {
    app: ScavAnnouncer,
    lines: Lines<BufReader<Stdin>>,
}

impl Menu {
    pub fn new(app: ScavAnnouncer) -> Self {
        Self {
            app,
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn prompt(&mut self, text: &str) -> Input {
        print!("{text}");
        let _ = std::io::stdout().flush();

        tokio::select! {
            line = self.lines.next_line() => match line {
                Ok(Some(line)) => Input::Line(line.trim().to_string()),
                Ok(None) => Input::Closed,
                Err(e) => {
                    debug!("stdin read failed: {e}");
                    Input::Closed
                }
            },
            _ = tokio::signal::ctrl_c() => Input::Interrupted,
        }
    }

    /// Prompt until a number is entered. `None` means the prompt was abandoned.
    async fn prompt_number<T: std::str::FromStr>(&mut self, text: &str) -> Option<T> {
        match self.prompt(text).await {
            Input::Line(line) => match line.parse() {
                Ok(n) => Some(n),
                Err(_) => {
                    println!("Invalid input! Please enter a valid number.");
                    None
                }
            },
            Input::Interrupted | Input::Closed => None,
        }
    }

    pub async fn run(mut self) {
        println!(
            "Successfully loaded {} items from the scavenger hunt list!",
            self.app.catalog().len()
        );

        loop {
            println!("{MENU}");
            if let Some(next) = self.app.next_run() {
                println!("(Next announcement: {})", next.format("%Y-%m-%d %H:%M:%S"));
            }

            let choice = match self.prompt("\nEnter your choice (1-9): ").await {
                Input::Line(line) => line,
                Input::Interrupted if self.app.is_running() => {
                    println!("\nStopping announcements...");
                    self.app.stop().await;
                    continue;
                }
                Input::Interrupted | Input::Closed => break,
            };

            match choice.as_str() {
                "1" => self.select_pages().await,
                "2" => self.select_range().await,
                "3" => self.select_random().await,
                "4" => self.start().await,
                "5" => println!("\n{}", self.app.preview()),
                "6" => self.announce_now().await,
                "7" => {
                    if self.app.is_running() {
                        let fired = self.app.stop().await;
                        println!("Announcements stopped after {fired} announcement(s).");
                    } else {
                        println!("Announcements are not running.");
                    }
                }
                "8" => println!("\n{}", self.app.recent_history(None)),
                "9" => break,
                _ => println!("Invalid choice! Please try again."),
            }
        }

        if self.app.is_running() {
            self.app.stop().await;
        }
        info!("Exiting menu");
        println!("Goodbye!");
    }

    async fn select_pages(&mut self) {
        let Input::Line(line) = self
            .prompt("Enter page numbers (comma-separated, e.g., 1,2,3): ")
            .await
        else {
            return;
        };
        match parse_page_list(&line) {
            Ok(pages) => {
                let n = self.app.select_by_pages(&pages);
                println!("\nSelected {n} items from pages {pages:?}");
                println!("\n{}", self.app.preview());
            }
            Err(e) => println!("{e}"),
        }
    }

    async fn select_range(&mut self) {
        let Some(start) = self.prompt_number::<u32>("Enter starting item number: ").await else {
            return;
        };
        let Some(end) = self.prompt_number::<u32>("Enter ending item number: ").await else {
            return;
        };
        match self.app.select_by_ordinal_range(start, end) {
            Ok(n) => {
                println!("\nSelected {n} items from numbers {start} to {end}");
                println!("\n{}", self.app.preview());
            }
            Err(e) => println!("{e}"),
        }
    }

    async fn select_random(&mut self) {
        let Some(count) = self
            .prompt_number::<usize>("How many random items do you want? ")
            .await
        else {
            return;
        };
        let n = self.app.select_random(count);
        if n < count {
            println!("Only {n} items available.");
        }
        println!("\nRandomly selected {n} items");
        println!("\n{}", self.app.preview());
    }

    async fn start(&mut self) {
        let hours = self.app.config().schedule.interval_hours;
        match self.app.start().await {
            Ok(()) => {
                println!("\nAnnouncements running every {hours} hour(s).");
                println!("(Choose 7 or press Ctrl+C to stop)");
            }
            Err(AnnouncerError::NoSelection) => println!("Please select items first!"),
            Err(e) => println!("{e}"),
        }
    }

    async fn announce_now(&mut self) {
        match self.app.announce_now().await {
            Ok(outcome) => {
                if outcome.wrapped {
                    println!("All items have been announced! Starting over.");
                }
                println!("\n{}", outcome.message);
            }
            Err(AnnouncerError::NoSelection) => {
                println!("No items selected! Please select items first.")
            }
            Err(e) => println!("Error making announcement: {e}"),
        }
    }
}

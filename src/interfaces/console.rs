use crate::application::machine::VendingMachine;
use crate::domain::coin::Denomination;
use crate::error::{Result, VendingError};
use rust_decimal::Decimal;
use std::io::Write;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// A line typed at the machine.
///
/// Menu digits are accepted as aliases: `1` buy, `2` insert, `3` refund,
/// `h` help, `e` exit.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Command {
    /// Buy a product, or list the menu when no id is given.
    Buy(Option<u32>),
    /// Insert a coin, or list accepted coins when no denomination is given.
    Insert(Option<i64>),
    Refund,
    Help,
    Exit,
}

impl FromStr for Command {
    type Err = VendingError;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let name = words.next().unwrap_or_default().to_ascii_lowercase();
        let argument = words.next();
        if words.next().is_some() {
            return Err(VendingError::InvalidArgument(format!(
                "Too many arguments in '{line}'"
            )));
        }

        let command = match name.as_str() {
            "1" | "buy" => Command::Buy(argument.map(parse_argument::<u32>).transpose()?),
            "2" | "insert" => Command::Insert(argument.map(parse_argument::<i64>).transpose()?),
            "3" | "refund" => Command::Refund,
            "h" | "help" => Command::Help,
            "e" | "exit" | "quit" => Command::Exit,
            _ => {
                return Err(VendingError::InvalidArgument(format!(
                    "Unknown command '{line}'"
                )));
            }
        };
        if argument.is_some() && matches!(command, Command::Refund | Command::Help | Command::Exit)
        {
            return Err(VendingError::InvalidArgument(format!(
                "'{name}' takes no argument"
            )));
        }
        Ok(command)
    }
}

fn parse_argument<T: FromStr>(raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| VendingError::InvalidArgument(format!("'{raw}' is not a number")))
}

/// Text front panel of the machine.
///
/// Reads one command per line until `exit` or end of input. Failed
/// operations are printed and the session carries on.
pub struct Console<'a, W: Write> {
    machine: &'a VendingMachine,
    out: W,
}

impl<'a, W: Write> Console<'a, W> {
    pub fn new(machine: &'a VendingMachine, out: W) -> Self {
        Self { machine, out }
    }

    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> Result<()> {
        writeln!(self.out, "My Vending Machine. Please buy something ...")?;
        self.show_menu()?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(Command::Exit) => break,
                Ok(command) => self.execute(command).await?,
                Err(e) => writeln!(self.out, "{e}. Please try again")?,
            }
        }

        writeln!(self.out, "Thanks for coming. Exiting....")?;
        self.out.flush()?;
        Ok(())
    }

    /// Runs one command. Only output failures are returned as errors.
    pub async fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Buy(None) => self.show_products().await?,
            Command::Buy(Some(product_id)) => {
                match self.machine.purchase(product_id).await {
                    Ok(vend) => {
                        writeln!(
                            self.out,
                            "Product ({}) {} is dispensed.",
                            vend.product.id, vend.product.name
                        )?;
                        if vend.change.is_empty() {
                            writeln!(self.out, "No change.")?;
                        } else {
                            let coins: Vec<String> = vend
                                .change
                                .iter()
                                .rev()
                                .map(|(denomination, count)| {
                                    format!("{count} x {}", self.coin_value(denomination))
                                })
                                .collect();
                            writeln!(self.out, "Change: {}", coins.join(", "))?;
                        }
                    }
                    Err(VendingError::PurchaseRefunded { source, refunded }) => {
                        writeln!(self.out, "{source}")?;
                        self.show_returned(&refunded)?;
                    }
                    Err(e) => writeln!(self.out, "{e}")?,
                }
                self.show_amount().await?;
            }
            Command::Insert(None) => self.show_coins().await?,
            Command::Insert(Some(value)) => {
                let inserted = match Denomination::new(value) {
                    Ok(denomination) => self.machine.insert_coin(denomination).await,
                    Err(e) => Err(e),
                };
                if let Err(e) = inserted {
                    writeln!(self.out, "Invalid denomination. {e}")?;
                }
                self.show_amount().await?;
            }
            Command::Refund => {
                let coins = self.machine.refund().await;
                self.show_returned(&coins)?;
                self.show_amount().await?;
            }
            Command::Help => self.show_help()?,
            Command::Exit => {}
        }
        Ok(())
    }

    fn coin_value(&self, denomination: Denomination) -> Decimal {
        self.machine
            .converter()
            .to_decimal(i64::from(denomination.value()))
    }

    fn show_returned(&mut self, coins: &[Denomination]) -> Result<()> {
        if coins.is_empty() {
            writeln!(self.out, "Nothing to return.")?;
        } else {
            let coins: Vec<String> = coins
                .iter()
                .map(|d| self.coin_value(*d).to_string())
                .collect();
            writeln!(self.out, "Returned: {}", coins.join(", "))?;
        }
        Ok(())
    }

    fn show_menu(&mut self) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "Menu")?;
        writeln!(self.out, "1 [id]   - Buy Something")?;
        writeln!(self.out, "2 [coin] - Insert Coin")?;
        writeln!(self.out, "3        - Give me my money back")?;
        writeln!(self.out, "H        - Help")?;
        writeln!(self.out, "E        - Exit")?;
        writeln!(self.out)?;
        Ok(())
    }

    async fn show_products(&mut self) -> Result<()> {
        writeln!(self.out, "Products")?;
        match self.machine.products().await {
            Ok(products) => {
                for product in products {
                    writeln!(self.out, "{} - {} ({})", product.id, product.name, product.price)?;
                }
            }
            Err(e) => writeln!(self.out, "{e}")?,
        }
        self.show_amount().await
    }

    async fn show_coins(&mut self) -> Result<()> {
        writeln!(self.out, "Coins Denomination Supported.")?;
        for denomination in self.machine.accepted_denominations().await {
            writeln!(self.out, "{} - {}", denomination, self.coin_value(denomination))?;
        }
        self.show_amount().await
    }

    async fn show_amount(&mut self) -> Result<()> {
        match self.machine.amount_inserted().await {
            Ok(amount) => writeln!(self.out, "You currently have: {amount}")?,
            Err(e) => writeln!(self.out, "{e}")?,
        }
        Ok(())
    }

    fn show_help(&mut self) -> Result<()> {
        writeln!(self.out, "Vending Machine Simulator")?;
        writeln!(self.out, "Accepted coins and their scale are set by the --settings file.")?;
        writeln!(self.out, "Coins loaded into the machine come from the --coins file.")?;
        writeln!(self.out, "Products on sale come from the --products file.")?;
        self.show_menu()
    }
}

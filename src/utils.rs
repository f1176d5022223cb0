use std::fmt::Display;
use std::str::FromStr;

use tracing_subscriber::EnvFilter;

/// Parse `"x,y,z"` into its three components
#[allow(clippy::many_single_char_names)]
pub fn parse_triplet<T: FromStr>(s: &str) -> Result<(T,T,T), String>
where
    <T as FromStr>::Err: Display,
{
    let v = s.split(',').map(str::trim).collect::<Vec<_>>();
    let [x, y, z] = v[..] else {
        return Err(format!("expected three comma-separated values, got `{s}`"));
    };
    let parse = |c: &str| c.parse::<T>().map_err(|e| format!("`{c}` in `{s}`: {e}"));
    Ok((parse(x)?, parse(y)?, parse(z)?))
}

/// Group numeric digits to facilitate reading long numbers
pub fn group_digits<F: Display>(n: F) -> String {
    use numsep::{separate, Locale};
    separate(n, Locale::English)
}

/// Send `tracing` events to stderr, filtered by `RUST_LOG` if it is set, by
/// `default_directive` otherwise
pub fn init_logging(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}


pub mod timing {

    use super::group_digits;
    use std::time::Instant;
    use std::io::Write;

    pub struct Progress {
        previous: Instant,
    }

    impl Progress {

        #[allow(clippy::new_without_default)]
        pub fn new() -> Self { Self { previous: Instant::now() } }

        /// Print message, append ellipsis, flush stdout, stay on same line, start timer.
        pub fn start(&mut self, message: &str) {
            print!("{message} ... ");
            std::io::stdout().flush().ok();
            self.start_timer();
        }

        /// Print message, go to next line, start timer
        pub fn startln(&mut self, message: &str) {
            println!("{message}");
            self.start_timer();
        }

        // Print time elapsed since last start or done
        pub fn done(&mut self) {
            println!("{} ms", group_digits(self.previous.elapsed().as_millis()));
            self.start_timer();
        }

        // Print message followed by time elapsed since last start or done
        pub fn done_with_message(&mut self, message: &str) {
            println!("{message}: {} ms",
                     group_digits(self.previous.elapsed().as_millis()));
            self.start_timer();
        }

        fn start_timer(&mut self) { self.previous = Instant::now() }
    }
}

use std::str::FromStr;

use crate::{Error, Result};

/// Parse `"lo,hi"` into a pair, as used for display windows on the command line
pub fn parse_pair<T>(s: &str) -> Result<(T, T)>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let bad = |why: String| Error::InvalidParameter(format!("cannot parse '{s}' as 'lo,hi': {why}"));
    let v = s.split(',').map(str::trim).collect::<Vec<_>>();
    if v.len() != 2 {
        return Err(bad(format!("found {} comma-separated values", v.len())));
    }
    let x = v[0].parse().map_err(|e: T::Err| bad(e.to_string()))?;
    let y = v[1].parse().map_err(|e: T::Err| bad(e.to_string()))?;
    Ok((x, y))
}

/// Group numeric digits to facilitate reading long numbers
pub fn group_digits<F: std::fmt::Display>(n: F) -> String {
    use numsep::{separate, Locale};
    separate(n, Locale::English)
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

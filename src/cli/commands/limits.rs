use clap::{Arg, Command};

pub const ARG_GLOBAL_RATE_LIMIT: &str = "global-rate-limit";
pub const ARG_USER_RATE_LIMIT: &str = "user-rate-limit";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_GLOBAL_RATE_LIMIT)
                .long(ARG_GLOBAL_RATE_LIMIT)
                .help("Requests per hour allowed from a single client IP")
                .env("VALET_GLOBAL_RATE_LIMIT")
                .default_value("100")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new(ARG_USER_RATE_LIMIT)
                .long(ARG_USER_RATE_LIMIT)
                .help("Lot requests per minute allowed for a single user")
                .env("VALET_USER_RATE_LIMIT")
                .default_value("10")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
}

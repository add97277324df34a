pub const BANNER: &str = concat!(
    r"
   ___           _        _  ___           _
  / _ \___  _ __| |_ __ _| |/ __|_ _ __ _ | |__
 |  __/ _ \| '__| __/ _` | | (__| '_/ _` || '_ \
 |_|  \___/|_|   \__\__,_|_|\___|_| \__,_||_.__/
",
    "  v",
    env!("CARGO_PKG_VERSION"),
);

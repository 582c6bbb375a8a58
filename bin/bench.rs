use clap::{Arg, ArgAction, Command};
use csvlex::{Format, HeaderMode, Reader, reader_from_path};
use std::path::PathBuf;
use std::time::Instant;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("bench")
        .arg(
            Arg::new("path")
                .long("path")
                .value_parser(clap::value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("header")
                .long("header")
                .help("Treat the first record as a header")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("delim")
                .long("delim")
                .default_value(","),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .help("Stop after N records")
                .value_parser(clap::value_parser!(u64)),
        )
        .get_matches();

    let path = matches.get_one::<PathBuf>("path").unwrap();
    let delim = matches.get_one::<String>("delim").unwrap();
    let limit = matches.get_one::<u64>("limit").copied();

    let mut format = Format::new().delimiter(delim.clone())?;
    if matches.get_flag("header") {
        format = format.header(HeaderMode::FirstRecord);
    }

    let start = Instant::now();
    let (reader, meta) = reader_from_path(path).await?;
    let mut rdr = Reader::new(reader, format)?;

    let headers: Option<Vec<String>> = rdr.headers().await?.map(|h| h.names().to_vec());

    let mut fields = 0u64;
    while let Some(record) = rdr.read_record().await? {
        fields += record.len() as u64;
        if limit.is_some_and(|lim| record.number() >= lim) {
            break;
        }
    }

    let rows = rdr.record_count();
    let elapsed = start.elapsed().as_secs_f64();
    let rps = rows as f64 / elapsed;
    println!(
        "source={} compression={:?} rows={rows} fields={fields} headers={headers:?}\nelapsed={elapsed:.1}s rows/sec={rps:.0}",
        meta.name, meta.compression
    );
    Ok(())
}

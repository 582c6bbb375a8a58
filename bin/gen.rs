use clap::{Arg, Command};
use csvlex::{Format, Writer};
use tokio::io::{self, AsyncWriteExt, BufWriter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("gen")
        .arg(
            Arg::new("rows")
                .long("rows")
                .value_parser(clap::value_parser!(u64))
                .required(true),
        )
        .arg(
            Arg::new("with_header")
                .long("with-header")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(Arg::new("cols").long("cols").default_value("3"))
        .arg(Arg::new("delim").long("delim").default_value(","))
        .arg(
            Arg::new("awkward")
                .long("awkward")
                .help("Embed delimiters/quotes/newlines in some fields to exercise quoting")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let rows: u64 = *matches.get_one("rows").unwrap();
    let with_header = matches.get_flag("with_header");
    let cols: usize = matches.get_one::<String>("cols").unwrap().parse()?;
    let delim = matches.get_one::<String>("delim").unwrap();
    let awkward = matches.get_flag("awkward");

    let format = Format::new().delimiter(delim.clone())?;
    let mut out = Writer::new(BufWriter::new(io::stdout()), format)?;

    if with_header {
        let mut header = vec!["sku".to_string()];
        for i in 1..cols {
            header.push(format!("col{i}"));
        }
        out.write_record(&header).await?;
    }

    // Deterministic data: sku, col1, col2, ...; `--awkward` salts in fields
    // the writer has to quote.
    let mut record = Vec::with_capacity(cols);
    for i in 0..rows {
        record.clear();
        record.push(format!("SKU{i:010}"));
        for c in 1..cols {
            if awkward && i % 97 == 0 {
                record.push(format!("v{c}{delim}\"x\"\n{i}"));
            } else {
                record.push(format!("v{c}_{i}"));
            }
        }
        out.write_record(&record).await?;
        if i % 10_000 == 0 {
            out.flush().await?; // keep buffers moving on huge runs
        }
    }

    out.flush().await?;
    out.into_inner().shutdown().await?;
    Ok(())
}

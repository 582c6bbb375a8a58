use csvlex::{Format, HeaderMode, Reader, reader_from_path};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = Path::new("./data/sample.csv.gz");
    let (reader, _meta) = reader_from_path(path).await?;

    let format = Format::new().header(HeaderMode::FirstRecord);
    let mut rdr = Reader::new(reader, format)?;

    while let Some(record) = rdr.read_record().await? {
        let sku = record.get_named("sku")?;
        println!("{}: {} fields, consistent={}", sku, record.len(), record.is_consistent());
    }
    Ok(())
}

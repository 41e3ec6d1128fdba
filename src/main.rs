//! Prints every element of an EBML stream, annotated by a schema.

use std::env;
use std::fs::File;
use std::process;

use log::info;

use ebml_reader::{ElemType, Result, Schema};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: {} <schema.edtd> <data.ebml>", args[0]);
        process::exit(2);
    }

    if let Err(err) = run(&args[1], &args[2]) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run(schema_path: &str, data_path: &str) -> Result<()> {
    info!("parsing schema {schema_path}");
    let schema = Schema::parse(File::open(schema_path)?)?;
    info!("schema loaded, reading {data_path}");

    for result in schema.iter_elems(File::open(data_path)?) {
        let elem = result?;
        let indent = "\t".repeat(elem.level as usize);
        let prefix = format!(
            "{}{:x} {} {}",
            indent,
            elem.id,
            elem.size.value(),
            elem.name
        );
        match elem.kind {
            ElemType::Int => println!("{} - {}", prefix, elem.int()?),
            ElemType::Uint => println!("{} - {}", prefix, elem.uint()?),
            ElemType::Float => println!("{} - {}", prefix, elem.float()?),
            ElemType::Date => println!("{} - {}", prefix, elem.date()?),
            ElemType::String => println!("{} - {}", prefix, elem.str()),
            ElemType::Binary | ElemType::Container => println!("{prefix}"),
        }
    }

    Ok(())
}

use std::{
    env, error, fs,
    io::{self, Read},
    process,
};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use sim::machine::Machine;

const DEFAULT_MEMORY_SIZE: usize = 64 * 1024;

fn main() {
    println!("tangerine v0.1.0");

    let args = env::args().skip(1).collect::<Vec<String>>();

    let name = match args.first() {
        Some(name) => {
            println!("loading {name}");
            name
        }
        None => {
            println!("usage: tangerine <program> [memory-size]");
            process::exit(1)
        }
    };

    let memory_size = match args.get(1) {
        Some(size) => match size.parse() {
            Ok(size) => size,
            Err(_) => {
                println!("invalid memory size: {size}");
                process::exit(1)
            }
        },
        None => DEFAULT_MEMORY_SIZE,
    };

    let file_appender = tracing_appender::rolling::never(env::temp_dir(), "tangerine.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    let program = match read_file(name) {
        Ok(d) => d,
        Err(e) => {
            println!("{e}");
            process::exit(2);
        }
    };

    let mut machine = Machine::new(memory_size);
    if let Err(e) = machine.load_program(0, &program) {
        println!("{e}");
        process::exit(2);
    }

    match machine.run() {
        Ok(executed) => {
            println!("executed {executed} instructions");
            print_state(&machine);
        }
        Err(e) => {
            println!("{e}");
            print_state(&machine);
            process::exit(3);
        }
    }
}

fn print_state(machine: &Machine) {
    for (index, value) in machine.cpu.registers.to_vec().iter().enumerate() {
        println!("R{index:<2} = {value:#010X}");
    }
    let cpsr = &machine.cpu.cpsr;
    println!(
        "N={} Z={} C={} V={}",
        u8::from(cpsr.sign_flag()),
        u8::from(cpsr.zero_flag()),
        u8::from(cpsr.carry_flag()),
        u8::from(cpsr.overflow_flag()),
    );
}

fn read_file(filepath: &str) -> Result<Vec<u8>, Box<dyn error::Error>> {
    let mut f = fs::File::open(filepath)?;
    let mut buf = vec![];
    f.read_to_end(&mut buf)?;

    Ok(buf)
}

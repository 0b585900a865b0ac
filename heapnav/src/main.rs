use clap::{Parser as ClapParser, Subcommand, ValueEnum};
use std::{path::PathBuf, process};

use heapnav::{
    DumpPaths, HeapDump, NavigatorError, ObjectNavigator, ReferenceResolution,
    mark_strongly_reachable,
};

const REFERENCE_PRINT_LIMIT: usize = 30;

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Heap index produced by the dump pass
    #[arg(help = "The .idx file of the processed dump")]
    index: PathBuf,

    /// Aux buffer, defaults to the index path with an .aux extension
    #[arg(long)]
    aux: Option<PathBuf>,

    /// Offset table, defaults to the index path with an .auxoffsets extension
    #[arg(long)]
    offsets: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode one object and print its class, size and references
    Show {
        id: u64,
        #[arg(long, value_enum, default_value_t = Resolution::Strong)]
        resolution: Resolution,
    },
    /// Follow a reference field of an instance
    Field {
        id: u64,
        field: String,
        /// Require the object to be an instance of exactly this class
        #[arg(long)]
        class: Option<String>,
    },
    /// Follow a static field of a class
    Static { class: String, field: String },
    /// Print the text of a java.lang.String
    #[command(name = "string")]
    Text { id: u64 },
    /// List GC roots
    Roots {
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Explain why an object is a root
    Reason { id: u64 },
    /// Mark everything strongly reachable from the GC roots
    Mark,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Resolution {
    All,
    Strong,
    #[value(name = "none")]
    Unresolved,
}

impl From<Resolution> for ReferenceResolution {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::All => ReferenceResolution::AllReferences,
            Resolution::Strong => ReferenceResolution::OnlyStrongReferences,
            Resolution::Unresolved => ReferenceResolution::NoReferences,
        }
    }
}

impl Cli {
    /// Paths next to the index unless overridden on the command line.
    fn dump_paths(&self) -> DumpPaths {
        let mut paths = DumpPaths::from_index(self.index.clone());
        if let Some(aux) = &self.aux {
            paths.aux = aux.clone();
        }
        if let Some(offsets) = &self.offsets {
            paths.offsets = offsets.clone();
        }
        paths
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let paths = cli.dump_paths();

    let dump = match HeapDump::open(&paths) {
        Ok(dump) => dump,
        Err(err) => {
            eprintln!("Error opening '{}': {}", paths.index.display(), err);
            process::exit(1);
        }
    };
    log::info!(
        "opened {} with {} classes, {} objects",
        paths.index.display(),
        dump.index().classes.len(),
        dump.index().instance_count
    );

    if let Err(err) = run(&dump, cli.command) {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn run(dump: &HeapDump, command: Command) -> Result<(), NavigatorError> {
    let mut nav = dump.navigator();
    match command {
        Command::Show { id, resolution } => {
            nav.go_to(id, resolution.into())?;
            print_object(&nav)?;
        }
        Command::Field { id, field, class } => {
            nav.go_to(id, ReferenceResolution::AllReferences)?;
            nav.go_to_instance_field(class.as_deref(), &field)?;
            print_object(&nav)?;
        }
        Command::Static { class, field } => {
            nav.go_to_static_field(&class, &field)?;
            print_object(&nav)?;
        }
        Command::Text { id } => {
            nav.go_to(id, ReferenceResolution::OnlyStrongReferences)?;
            match nav.string_instance_field_value()? {
                Some(text) => println!("{text:?}"),
                None => println!("null"),
            }
        }
        Command::Roots { limit } => {
            for root in nav.roots().take(limit) {
                println!("{:>12}  {}", root.id, root.reason);
            }
        }
        Command::Reason { id } => match nav.root_reason_for_object_id(id) {
            Some(reason) => println!("{id}: {reason}"),
            None => println!("{id}: not a root"),
        },
        Command::Mark => {
            let result = mark_strongly_reachable(&mut nav)?;
            println!("reachable objects:     {}", result.reachable_count());
            println!("reachable bytes:       {}", result.reachable_size);
            println!("softly reachable only: {}", result.softly_reachable_only);
            println!("weakly reachable only: {}", result.weakly_reachable_only);
        }
    }
    Ok(())
}

fn print_object(nav: &impl ObjectNavigator) -> Result<(), NavigatorError> {
    if nav.is_null() {
        println!("null");
        return Ok(());
    }

    let class = nav.class()?;
    println!("object {} : {}", nav.id(), class.pretty_name());
    println!("  size: {}", nav.object_size()?);
    if let Some(length) = nav.array_length() {
        println!("  length: {length}");
    }
    if nav.extra_data() != 0 {
        println!("  extra data: {}", nav.extra_data());
    }
    if let Some(reason) = nav.root_reason_for_object_id(nav.id()) {
        println!("  root: {reason}");
    }
    if nav.soft_reference_id() != 0 {
        println!("  soft referent: {}", nav.soft_reference_id());
    }
    if nav.weak_reference_id() != 0 {
        println!("  weak referent: {}", nav.weak_reference_id());
    }

    let references = match nav.references() {
        Ok(references) => references,
        Err(NavigatorError::ReferencesNotComputed { .. }) => return Ok(()),
        Err(err) => return Err(err),
    };
    println!("  references ({}):", references.len());
    for &reference in references.iter().take(REFERENCE_PRINT_LIMIT) {
        if reference == 0 {
            println!("    null");
            continue;
        }
        match nav.class_for_object_id(reference) {
            Ok(class) => println!("    {reference} : {}", class.pretty_name()),
            Err(err) => println!("    {reference} : <{err}>"),
        }
    }
    if references.len() > REFERENCE_PRINT_LIMIT {
        println!("    ... {} more", references.len() - REFERENCE_PRINT_LIMIT);
    }
    Ok(())
}

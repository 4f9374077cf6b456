//! Builds a small tree, then removes nodes one at a time, printing the
//! tree after every step.  Set `RUST_LOG=ordered_tree=debug` to see the
//! structural mutations as they happen.

use ordered_tree::{OrderedTree, Position, Result};
use tracing_subscriber::{fmt, EnvFilter};

fn install_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .init();
}

fn banner(title: &str) {
    let rule = "-".repeat(20);
    println!("{rule} {title} {rule}");
}

fn show(tree: &OrderedTree<&str>) {
    println!("Size: {}", tree.size());
    print!("{tree}");
}

fn remove_and_show(tree: &mut OrderedTree<&str>, label: &str, pos: Position) -> Result<()> {
    banner(&format!("REMOVE {label}"));
    match tree.remove(pos)? {
        Some(element) => tracing::info!(%element, "removed"),
        None => tracing::info!(%label, "root left in place"),
    }
    show(tree);
    Ok(())
}

fn main() -> Result<()> {
    install_tracing();

    let mut tree = OrderedTree::new();
    let a = tree.add_root("A")?;
    let b = tree.add_child(a, "B")?;
    let c = tree.add_child(a, "C")?;
    let d = tree.add_child(a, "D")?;
    let x = tree.add_child(c, "X")?;
    tree.add_child(b, "E")?;
    tree.add_child(b, "F")?;
    let g = tree.add_child(d, "G")?;
    tree.add_child(d, "Q")?;

    banner("DISPLAY TREE");
    show(&tree);

    for (label, pos) in [("X", x), ("C", c), ("B", b), ("G", g), ("D", d), ("A", a)] {
        remove_and_show(&mut tree, label, pos)?;
    }
    Ok(())
}

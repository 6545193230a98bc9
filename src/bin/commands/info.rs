use std::collections::BTreeMap;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Args;
use prettytable::{Table, format, row};

use zmat_forge::ops::bond_graph;
use zmat_forge::{BondGraph, Element, Molecule, Point};

use crate::commands::{BondArgs, run_with_spinner};

/// Report-only command that summarizes a molecule and its bonds.
#[derive(Debug, Args)]
pub struct InfoArgs {
    #[command(flatten)]
    pub bonds: BondArgs,
}

/// Computes and prints molecule statistics without modifying anything.
pub fn run(molecule: &Molecule, args: &InfoArgs) -> Result<()> {
    let config = args.bonds.config();
    let (element_reports, summary) = run_with_spinner("Analyzing molecule", || {
        let graph = bond_graph(molecule, &config).context("Failed to perceive bonds")?;
        Ok((collect_element_reports(molecule), summarize(molecule, &graph)))
    })?;

    print_tables(&element_reports, &summary)
}

fn collect_element_reports(molecule: &Molecule) -> Vec<ElementReport> {
    let mut counts: BTreeMap<Element, usize> = BTreeMap::new();
    for atom in molecule.iter_atoms() {
        *counts.entry(atom.element).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(element, count)| ElementReport {
            symbol: element.symbol(),
            count,
            bond_size: element.bond_size(),
            valency: element.valency(),
        })
        .collect()
}

fn summarize(molecule: &Molecule, graph: &BondGraph) -> Summary {
    let oversaturated = molecule
        .iter()
        .filter(|(key, atom)| graph.degree(*key).is_some_and(|degree| degree > atom.valency()))
        .count();

    Summary {
        atoms: molecule.atom_count(),
        formula: molecule.formula(),
        mass: molecule.total_mass(),
        center: molecule.topologic_center(),
        center_of_mass: molecule.center_of_mass(),
        bonds: graph.bond_count(),
        isolated: graph.iter().filter(|(_, partners)| partners.is_empty()).count(),
        oversaturated,
    }
}

fn print_tables(reports: &[ElementReport], summary: &Summary) -> Result<()> {
    let mut stderr = io::stderr().lock();

    print_boxed_label(&mut stderr, "zforge Molecule Report")?;
    writeln!(&mut stderr)?;

    let mut element_table = Table::new();
    print_boxed_label(&mut stderr, "Element Breakdown")?;
    element_table.set_format(*format::consts::FORMAT_BOX_CHARS);
    element_table.set_titles(row!["Element", "Atoms", "Bond Size (Å)", "Valency"]);
    for report in reports {
        element_table.add_row(row![
            report.symbol,
            report.count,
            format!("{:.3}", report.bond_size),
            report.valency
        ]);
    }
    element_table
        .print(&mut stderr)
        .context("Failed to render element summary")?;
    writeln!(&mut stderr)?;

    let mut summary_table = Table::new();
    print_boxed_label(&mut stderr, "Molecule Summary")?;
    summary_table.set_format(*format::consts::FORMAT_BOX_CHARS);
    summary_table.set_titles(row!["Metric", "Value"]);
    summary_table.add_row(row!["Atoms", summary.atoms]);
    summary_table.add_row(row!["Formula", summary.formula]);
    summary_table.add_row(row!["Total Mass (g/mol)", format!("{:.4}", summary.mass)]);
    summary_table.add_row(row!["Topological Center (Å)", format_point(&summary.center)]);
    summary_table.add_row(row!["Center of Mass (Å)", format_point(&summary.center_of_mass)]);
    summary_table.add_row(row!["Bonds", summary.bonds]);
    summary_table.add_row(row!["Unbonded Atoms", summary.isolated]);
    summary_table.add_row(row!["Atoms Above Valency", summary.oversaturated]);
    summary_table
        .print(&mut stderr)
        .context("Failed to render molecule summary")?;

    Ok(())
}

fn format_point(point: &Point) -> String {
    format!("({:.3}, {:.3}, {:.3})", point.x, point.y, point.z)
}

fn print_boxed_label<W: Write>(writer: &mut W, title: &str) -> io::Result<()> {
    let inner = format!(" {title} ");
    let width = inner.chars().count();
    writeln!(writer, "╭{}╮", "─".repeat(width))?;
    writeln!(writer, "│{}│", inner)?;
    writeln!(writer, "╰{}╯", "─".repeat(width))?;
    Ok(())
}

#[derive(Debug)]
struct ElementReport {
    symbol: &'static str,
    count: usize,
    bond_size: f64,
    valency: usize,
}

#[derive(Debug)]
struct Summary {
    atoms: usize,
    formula: String,
    mass: f64,
    center: Point,
    center_of_mass: Point,
    bonds: usize,
    isolated: usize,
    oversaturated: usize,
}

use core::fmt;
use galley::ShutdownReport;

/// Human-readable rendering of a [`ShutdownReport`].
pub struct Summary<'a>(pub &'a ShutdownReport);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let stats = &report.stats;

        writeln!(f, "Restaurant closed.")?;
        writeln!(
            f,
            "  orders: {} placed, {} taken, {} abandoned",
            stats.created, stats.admitted, stats.abandoned
        )?;
        writeln!(
            f,
            "  meals:  {} served, {} ruined, {} eaten",
            stats.delivered, stats.failed, stats.completed
        )?;
        writeln!(
            f,
            "  waiter: busiest at {} of {} orders",
            report.high_water_mark, report.capacity
        )?;

        writeln!(f, "Customers:")?;
        for customer in &report.requesters {
            write!(
                f,
                "  {:<12} ate {}, abandoned {}",
                customer.label, customer.completed, customer.abandoned
            )?;
            if customer.failed > 0 {
                write!(f, ", sent back {}", customer.failed)?;
            }
            if customer.stopped_early {
                write!(f, " (left early)")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Cooks:")?;
        for cook in &report.workers {
            write!(f, "  {:<12} cooked {}", cook.name, cook.processed)?;
            if cook.failed > 0 {
                write!(f, ", ruined {}", cook.failed)?;
            }
            if cook.undeliverable > 0 {
                write!(f, ", {} went cold", cook.undeliverable)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galley::{RequesterReport, StatsSnapshot, WorkerReport};
    use std::sync::Arc;

    #[test]
    fn summarizes_customers_and_cooks() {
        let report = ShutdownReport {
            stats: StatsSnapshot {
                created: 7,
                admitted: 6,
                abandoned: 1,
                delivered: 6,
                failed: 1,
                completed: 5,
            },
            high_water_mark: 3,
            capacity: 3,
            requesters: vec![RequesterReport {
                label: Arc::from("Ani"),
                completed: 5,
                abandoned: 1,
                failed: 1,
                stopped_early: false,
            }],
            workers: vec![WorkerReport {
                name: Arc::from("Remy"),
                processed: 6,
                failed: 1,
                undeliverable: 0,
            }],
        };

        let text = Summary(&report).to_string();
        assert!(text.contains("7 placed, 6 taken, 1 abandoned"));
        assert!(text.contains("busiest at 3 of 3 orders"));
        assert!(text.contains("Ani          ate 5, abandoned 1, sent back 1\n"));
        assert!(text.contains("Remy         cooked 6, ruined 1\n"));
    }
}

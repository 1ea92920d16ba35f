use owo_colors::OwoColorize;

use crate::balancer::BalanceOutcome;
use crate::simulation::SimulationReport;

/// Terminal rendering of finished runs.
pub struct Console {
    no_color: bool,
}

impl Console {
    pub fn new(no_color: bool) -> Self {
        Self { no_color }
    }

    pub fn print_report(&self, report: &SimulationReport) {
        let players = &report.players;
        if self.no_color {
            println!(
                "Summary: rounds={}, players={}, win rate={:.2}%, return={:.2}%, house take={:.2}%",
                report.rounds_completed,
                report.player_count,
                players.win_rate * 100.0,
                players.return_percent,
                report.house.take_percent
            );
        } else {
            println!(
                "{} {} {} {} {} {:.2}% {} {:.2}% {} {:.2}%",
                "Summary".bold().magenta(),
                report.rounds_completed,
                "Players".bold().white(),
                report.player_count,
                "Win rate".bold().white(),
                players.win_rate * 100.0,
                "Return".bold().white(),
                players.return_percent,
                "House take".bold().yellow(),
                report.house.take_percent
            );
        }

        println!(
            "Outcomes: {} win / {} lose / {} tie / {} bust, net {} credits on {} wagered",
            players.wins,
            players.losses,
            players.ties,
            players.busts,
            players.net_credits,
            players.total_wagered
        );

        self.heading("Tubes");
        for row in &report.tubes {
            println!(
                "  {:<3} funded {:>7} taken {:>7} hits {:>5} busts {:>5} balance {:>6} return {:>6.2}%",
                row.tube.code(),
                row.seed + row.funded,
                row.taken,
                row.hits,
                row.busts,
                row.final_balance,
                row.return_rate * 100.0
            );
        }

        self.heading("Top rules");
        for rule in &report.top_rules {
            println!(
                "  {:<8} {:>7} uses ({:>5.1}%) win {:>5.1}%  {}",
                rule.id,
                rule.uses,
                rule.usage_percent,
                rule.win_rate * 100.0,
                rule.description
            );
        }

        self.heading("Hands");
        for share in &report.hand_distribution {
            println!(
                "  {:<16} {:>8} {:>7.3}%",
                share.category.label(),
                share.count,
                share.percent
            );
        }
    }

    pub fn print_balance(&self, outcome: &BalanceOutcome) {
        for step in &outcome.steps {
            println!(
                "Iteration {} | multiplier {:.3} | edge {:.4}",
                step.iteration, step.bust_penalty_multiplier, step.house_edge
            );
        }
        let verdict = if outcome.converged {
            "Edge stabilised inside the target band"
        } else {
            "Edge did not stabilise within the iteration budget"
        };
        if self.no_color {
            println!("{verdict}");
        } else if outcome.converged {
            println!("{}", verdict.bold().green());
        } else {
            println!("{}", verdict.bold().red());
        }
        self.print_report(&outcome.report);
    }

    fn heading(&self, title: &str) {
        if self.no_color {
            println!("{title}:");
        } else {
            println!("{}", title.bold().cyan());
        }
    }
}

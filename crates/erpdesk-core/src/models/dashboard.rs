//! Overview figures shown on the dashboard. These are fixed sample values;
//! there is no backing service for them.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatCard {
    pub title: &'static str,
    pub value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activity {
    pub summary: &'static str,
    pub when: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    pub priority: Priority,
    pub due_in_days: u32,
}

impl Task {
    pub fn title(&self) -> String {
        format!("{} priority task", self.priority.label())
    }

    pub fn due_label(&self) -> String {
        format!("Due in {} days", self.due_in_days)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceBand {
    Strong,
    OnTrack,
    NeedsAttention,
}

impl PerformanceBand {
    pub fn for_progress(progress: u8) -> Self {
        match progress {
            80.. => PerformanceBand::Strong,
            70..=79 => PerformanceBand::OnTrack,
            _ => PerformanceBand::NeedsAttention,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceEntry {
    pub name: &'static str,
    pub role: &'static str,
    /// Percent, 0-100
    pub progress: u8,
}

impl PerformanceEntry {
    pub fn band(&self) -> PerformanceBand {
        PerformanceBand::for_progress(self.progress)
    }
}

pub fn stat_cards() -> [StatCard; 4] {
    [
        StatCard { title: "Total Employees", value: 25 },
        StatCard { title: "Active Tasks", value: 12 },
        StatCard { title: "Hours Logged", value: 164 },
        StatCard { title: "Completed Tasks", value: 38 },
    ]
}

pub fn recent_activity() -> Vec<Activity> {
    vec![
        Activity {
            summary: "Task updated by user",
            when: "2 hours ago",
        };
        5
    ]
}

/// Five tasks, priority cycling High, Medium, Low, due in 1..=5 days
pub fn upcoming_tasks() -> Vec<Task> {
    const CYCLE: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];
    (0..5u32)
        .map(|i| Task {
            priority: CYCLE[i as usize % CYCLE.len()],
            due_in_days: i + 1,
        })
        .collect()
}

pub fn employee_performance() -> [PerformanceEntry; 4] {
    [
        PerformanceEntry { name: "John Doe", role: "Developer", progress: 75 },
        PerformanceEntry { name: "Jane Smith", role: "Designer", progress: 82 },
        PerformanceEntry { name: "Robert Johnson", role: "Manager", progress: 90 },
        PerformanceEntry { name: "Emily Davis", role: "Marketing", progress: 68 },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_cards() {
        let values: Vec<u32> = stat_cards().iter().map(|c| c.value).collect();
        assert_eq!(values, vec![25, 12, 164, 38]);
    }

    #[test]
    fn test_upcoming_tasks_cycle() {
        let tasks = upcoming_tasks();
        assert_eq!(tasks.len(), 5);
        assert_eq!(tasks[0].title(), "High priority task");
        assert_eq!(tasks[3].priority, Priority::High);
        assert_eq!(tasks[4].priority, Priority::Medium);
        assert_eq!(tasks[4].due_label(), "Due in 5 days");
    }

    #[test]
    fn test_performance_bands() {
        assert_eq!(PerformanceBand::for_progress(80), PerformanceBand::Strong);
        assert_eq!(PerformanceBand::for_progress(79), PerformanceBand::OnTrack);
        assert_eq!(PerformanceBand::for_progress(70), PerformanceBand::OnTrack);
        assert_eq!(PerformanceBand::for_progress(69), PerformanceBand::NeedsAttention);

        let bands: Vec<_> = employee_performance().iter().map(|e| e.band()).collect();
        assert_eq!(
            bands,
            vec![
                PerformanceBand::OnTrack,
                PerformanceBand::Strong,
                PerformanceBand::Strong,
                PerformanceBand::NeedsAttention
            ]
        );
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use class_scheduler::{
    AppConfig, ClassDraft, ClassFilter, DropEvent, DropLocation, DropOutcome, Group,
    ScheduledClass, Scheduler, StoreSummary, Student, Teacher, WeekGrid, apply_drop,
    export_to_json, import_from_json,
    placement::{self, move_class_to_slot},
    render_text_report, save_classes_to_csv, search_highlight,
};
use std::collections::HashMap;
use std::io::{self, Write};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Interactive console for the class scheduler
#[derive(Parser, Debug)]
#[command(name = "class-scheduler", version)]
struct Cli {
    #[command(flatten)]
    config: AppConfig,
}

fn cell_label(class: &ScheduledClass, scheduler: &Scheduler, highlight: Option<bool>) -> String {
    let name = match (class.group_id(), class.student_id()) {
        (Some(group_id), _) => scheduler
            .find_group(group_id)
            .map(|g| g.name.clone())
            .unwrap_or_else(|| group_id.to_string()),
        (None, Some(student_id)) => scheduler
            .find_student(student_id)
            .map(|s| format!("{} (ind.)", s.name))
            .unwrap_or_else(|| student_id.to_string()),
        (None, None) => class.id.clone(),
    };
    match highlight {
        Some(true) => format!("*{name}*"),
        _ => name,
    }
}

fn render_week_as_text_table(scheduler: &Scheduler, filter: &ClassFilter, query: &str) -> String {
    let grid = scheduler.grid();
    let groups: HashMap<&str, &Group> = scheduler
        .groups()
        .iter()
        .map(|g| (g.id.as_str(), g))
        .collect();
    let visible: Vec<ScheduledClass> = filter
        .apply(scheduler.scheduled_classes())
        .into_iter()
        .cloned()
        .collect();

    let mut col_names = vec!["time".to_string()];
    col_names.extend(WeekGrid::DAYS.iter().map(|d| WeekGrid::day_name(*d).to_string()));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for hour in grid.hours() {
        let mut row = vec![format!("{hour:02}:00")];
        for day in WeekGrid::DAYS {
            let cell = grid
                .classes_in_slot(&visible, class_scheduler::Slot::new(day, hour))
                .into_iter()
                .map(|class| {
                    cell_label(class, scheduler, search_highlight(class, &groups, query))
                })
                .collect::<Vec<_>>()
                .join(", ");
            row.push(cell);
        }
        rows.push(row);
    }

    // Compute column widths
    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &rows {
        for (ci, cell) in row.iter().enumerate() {
            if cell.len() > widths[ci] {
                widths[ci] = cell.len();
            }
        }
    }

    let mut sep = String::new();
    sep.push('+');
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names, &widths));
    out.push_str(&sep);
    out.push('\n');
    for row in &rows {
        out.push_str(&render_row(row, &widths));
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn render_row(cells: &[String], widths: &[usize]) -> String {
    let mut out = String::from("|");
    for (ci, cell) in cells.iter().enumerate() {
        out.push(' ');
        out.push_str(cell);
        let pad = widths[ci].saturating_sub(cell.len());
        if pad > 0 {
            out.push_str(&" ".repeat(pad));
        }
        out.push_str(" |");
    }
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                                        Show this help\n  show                                        Show the weekly grid (current filter and search applied)\n  filter teacher <id> | group <id> | clear    Narrow the grid to a teacher or group\n  search <text...>                            Highlight classes whose group name matches\n  teachers | students | groups | classes      List entities\n  teacher add <id> <name...>                  Add a teacher\n  teacher rename <id> <name...>               Rename a teacher\n  teacher delete <id>                         Delete a teacher, its groups and classes\n  student add <id> <name...>                  Add a student\n  student rename <id> <name...>               Rename a student\n  student link <id> <url>                     Set a student's profile link\n  student delete <id>                         Delete a student and drop it from groups\n  group add <id> <teacher_id> <name...>       Add a group\n  group rename <id> <name...>                 Rename a group\n  group join <id> <student_id>                Add a student to a group\n  group leave <id> <student_id>               Remove a student from a group\n  group delete <id>                           Delete a group and its classes\n  class group <teacher_id> <group_id> <YYYY-MM-DD> <HH:00>\n                                              Schedule a group class\n  class student <teacher_id> <student_id> <YYYY-MM-DD> <HH:00>\n                                              Schedule an individual class\n  class move <id> <Day> <HH:00>               Move a class within its week\n  class delete <id>                           Delete a class\n  drop <class_id> <from_cell> <to_cell|->     Apply a raw drop event (cells like cell-Monday-09:00)\n  report                                      Print the text report\n  summary                                     Show collection counts and storage size\n  export <dir>                                Write a dated JSON backup into <dir>\n  import <path>                               Replace all data from a JSON backup\n  csv <path>                                  Write scheduled classes as CSV\n  clear                                       Delete all data\n  quit|exit                                   Exit"
    );
}

fn rest(parts: std::str::SplitWhitespace<'_>) -> Option<String> {
    let words: Vec<&str> = parts.collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

fn parse_start(scheduler: &Scheduler, date_s: &str, hour_s: &str) -> Result<DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(date_s, "%Y-%m-%d")
        .map_err(|_| "Invalid date (YYYY-MM-DD)".to_string())?;
    let hour =
        placement::parse_hour_label(hour_s).ok_or_else(|| "Invalid hour (HH:00)".to_string())?;
    scheduler
        .grid()
        .at(date, hour)
        .ok_or_else(|| "Invalid start time".to_string())
}

fn list_teachers(scheduler: &Scheduler) {
    for teacher in scheduler.teachers() {
        println!("  {:<12} {}", teacher.id, teacher.name);
    }
}

fn list_students(scheduler: &Scheduler) {
    for student in scheduler.students() {
        println!("  {:<12} {} {}", student.id, student.name, student.crm_profile_link);
    }
}

fn list_groups(scheduler: &Scheduler) {
    for group in scheduler.groups() {
        println!(
            "  {:<12} {} (teacher {}) [{}]",
            group.id,
            group.name,
            group.teacher_id,
            group.student_ids.join(", ")
        );
    }
}

fn list_classes(scheduler: &Scheduler, filter: &ClassFilter) {
    let grid = scheduler.grid();
    for class in filter.apply(scheduler.scheduled_classes()) {
        let start = grid.local(class.start_time);
        let end = grid.local(class.end_time());
        let attendee = match (class.group_id(), class.student_id()) {
            (Some(id), _) => format!("group {id}"),
            (None, Some(id)) => format!("student {id}"),
            (None, None) => String::new(),
        };
        println!(
            "  {:<38} {} {}-{} teacher {} {}",
            class.id,
            WeekGrid::day_name(grid.slot_of(class.start_time).weekday),
            start.format("%Y-%m-%d %H:%M"),
            end.format("%H:%M"),
            class.teacher_id,
            attendee
        );
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(filter)
        .init();

    let cli = Cli::parse();
    let mut scheduler = match cli.config.open_scheduler() {
        Ok(scheduler) => scheduler,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let mut class_filter = ClassFilter::default();
    let mut query = String::new();

    println!("Class Scheduler (CLI) - type 'help' for commands\n");
    println!("{}", render_week_as_text_table(&scheduler, &class_filter, &query));

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => println!("{}", render_week_as_text_table(&scheduler, &class_filter, &query)),
            "teachers" => list_teachers(&scheduler),
            "students" => list_students(&scheduler),
            "groups" => list_groups(&scheduler),
            "classes" => list_classes(&scheduler, &class_filter),
            "filter" => match (parts.next(), parts.next()) {
                (Some("teacher"), Some(id)) => {
                    class_filter.teacher_id = Some(id.to_string());
                    println!("Filtering by teacher {}.", id);
                }
                (Some("group"), Some(id)) => {
                    class_filter.group_id = Some(id.to_string());
                    println!("Filtering by group {}.", id);
                }
                (Some("clear"), _) => {
                    class_filter = ClassFilter::default();
                    println!("Filter cleared.");
                }
                _ => println!("Usage: filter teacher <id> | group <id> | clear"),
            },
            "search" => {
                query = rest(parts).unwrap_or_default();
                println!("{}", render_week_as_text_table(&scheduler, &class_filter, &query));
            }
            "teacher" => match (parts.next(), parts.next()) {
                (Some("add"), Some(id)) => match rest(parts) {
                    Some(name) => {
                        scheduler.add_teacher(Teacher::new(id, name));
                        println!("Added teacher {}.", id);
                    }
                    None => println!("Usage: teacher add <id> <name...>"),
                },
                (Some("rename"), Some(id)) => match rest(parts) {
                    Some(name) => {
                        if scheduler.update_teacher(Teacher::new(id, name)) {
                            println!("Renamed teacher {}.", id);
                        } else {
                            println!("Teacher {} not found.", id);
                        }
                    }
                    None => println!("Usage: teacher rename <id> <name...>"),
                },
                (Some("delete"), Some(id)) => {
                    let outcome = scheduler.delete_teacher(id);
                    println!("Deleted teacher {} ({}).", id, outcome.to_cli_summary());
                }
                _ => println!("Usage: teacher add|rename|delete <id> ..."),
            },
            "student" => match (parts.next(), parts.next()) {
                (Some("add"), Some(id)) => match rest(parts) {
                    Some(name) => {
                        scheduler.add_student(Student::new(id, name));
                        println!("Added student {}.", id);
                    }
                    None => println!("Usage: student add <id> <name...>"),
                },
                (Some("rename"), Some(id)) => match (scheduler.find_student(id).cloned(), rest(parts)) {
                    (Some(mut student), Some(name)) => {
                        student.name = name;
                        scheduler.update_student(student);
                        println!("Renamed student {}.", id);
                    }
                    (None, _) => println!("Student {} not found.", id),
                    _ => println!("Usage: student rename <id> <name...>"),
                },
                (Some("link"), Some(id)) => match (scheduler.find_student(id).cloned(), parts.next()) {
                    (Some(student), Some(link)) => {
                        scheduler.update_student(student.with_profile_link(link));
                        println!("Updated profile link of student {}.", id);
                    }
                    (None, _) => println!("Student {} not found.", id),
                    _ => println!("Usage: student link <id> <url>"),
                },
                (Some("delete"), Some(id)) => {
                    let outcome = scheduler.delete_student(id);
                    println!("Deleted student {} ({}).", id, outcome.to_cli_summary());
                }
                _ => println!("Usage: student add|rename|link|delete <id> ..."),
            },
            "group" => match (parts.next(), parts.next()) {
                (Some("add"), Some(id)) => match (parts.next(), rest(parts)) {
                    (Some(teacher_id), Some(name)) => {
                        scheduler.add_group(Group::new(id, name, teacher_id));
                        println!("Added group {}.", id);
                    }
                    _ => println!("Usage: group add <id> <teacher_id> <name...>"),
                },
                (Some("rename"), Some(id)) => match (scheduler.find_group(id).cloned(), rest(parts)) {
                    (Some(mut group), Some(name)) => {
                        group.name = name;
                        scheduler.update_group(group);
                        println!("Renamed group {}.", id);
                    }
                    (None, _) => println!("Group {} not found.", id),
                    _ => println!("Usage: group rename <id> <name...>"),
                },
                (Some(action @ ("join" | "leave")), Some(id)) => {
                    match (scheduler.find_group(id).cloned(), parts.next()) {
                        (Some(mut group), Some(student_id)) => {
                            if action == "join" {
                                if !group.has_student(student_id) {
                                    group.student_ids.push(student_id.to_string());
                                }
                            } else {
                                group.student_ids.retain(|sid| sid != student_id);
                            }
                            scheduler.update_group(group);
                            println!("Updated members of group {}.", id);
                        }
                        (None, _) => println!("Group {} not found.", id),
                        _ => println!("Usage: group {} <id> <student_id>", action),
                    }
                }
                (Some("delete"), Some(id)) => {
                    let outcome = scheduler.delete_group(id);
                    println!("Deleted group {} ({}).", id, outcome.to_cli_summary());
                }
                _ => println!("Usage: group add|rename|join|leave|delete <id> ..."),
            },
            "class" => match parts.next() {
                Some(kind @ ("group" | "student")) => {
                    match (parts.next(), parts.next(), parts.next(), parts.next()) {
                        (Some(teacher_id), Some(target), Some(date_s), Some(hour_s)) => {
                            let start = match parse_start(&scheduler, date_s, hour_s) {
                                Ok(start) => start,
                                Err(msg) => {
                                    println!("{}", msg);
                                    continue;
                                }
                            };
                            let draft = if kind == "group" {
                                ClassDraft::for_group(teacher_id, target, start)
                            } else {
                                ClassDraft::for_student(teacher_id, target, start)
                            };
                            match scheduler.add_scheduled_class(draft) {
                                Ok(class) => println!("Class scheduled: {}", class.id),
                                Err(e) => println!("Rejected: {}", e),
                            }
                        }
                        _ => println!(
                            "Usage: class {} <teacher_id> <{}_id> <YYYY-MM-DD> <HH:00>",
                            kind, kind
                        ),
                    }
                }
                Some("move") => match (parts.next(), parts.next(), parts.next()) {
                    (Some(id), Some(day_s), Some(hour_s)) => {
                        let day = WeekGrid::parse_day_name(day_s);
                        let hour = placement::parse_hour_label(hour_s);
                        match (day, hour) {
                            (Some(day), Some(hour)) => {
                                let slot = class_scheduler::Slot::new(day, hour);
                                match move_class_to_slot(&mut scheduler, id, slot) {
                                    Ok(_) => println!("Moved class {} to {}.", id, slot),
                                    Err(e) => println!("Rejected: {}", e),
                                }
                            }
                            _ => println!("Invalid day or hour (e.g. Tuesday 10:00)"),
                        }
                    }
                    _ => println!("Usage: class move <id> <Day> <HH:00>"),
                },
                Some("delete") => match parts.next() {
                    Some(id) => {
                        if scheduler.delete_scheduled_class(id) {
                            println!("Deleted class {}.", id);
                        } else {
                            println!("Class {} not found.", id);
                        }
                    }
                    None => println!("Usage: class delete <id>"),
                },
                _ => println!("Usage: class group|student|move|delete ..."),
            },
            "drop" => match (parts.next(), parts.next(), parts.next()) {
                (Some(class_id), Some(from), Some(to)) => {
                    let event = DropEvent {
                        class_id: class_id.to_string(),
                        source: DropLocation::new(from, 0),
                        destination: (to != "-").then(|| DropLocation::new(to, 0)),
                    };
                    match apply_drop(&mut scheduler, &event) {
                        Ok(DropOutcome::Moved { class }) => println!(
                            "Moved class {} to {}.",
                            class.id,
                            scheduler.grid().slot_of(class.start_time)
                        ),
                        Ok(DropOutcome::Ignored { reason }) => {
                            println!("Drop ignored ({:?}).", reason)
                        }
                        Err(e) => println!("Rejected: {}", e),
                    }
                }
                _ => println!("Usage: drop <class_id> <from_cell> <to_cell|->"),
            },
            "report" => print!("{}", render_text_report(&scheduler)),
            "summary" => println!("{}", StoreSummary::collect(&scheduler).to_cli_summary()),
            "export" => match parts.next() {
                Some(dir) => match export_to_json(&scheduler.export_snapshot(), dir) {
                    Ok(path) => println!("Exported to {}", path.display()),
                    Err(e) => println!("Export error: {}", e),
                },
                None => println!("Usage: export <dir>"),
            },
            "import" => match parts.next() {
                Some(path) => match import_from_json(path) {
                    Ok(snapshot) => {
                        scheduler.import_snapshot(snapshot);
                        println!("Imported from {}", path);
                    }
                    Err(e) => println!("Import error: {}", e),
                },
                None => println!("Usage: import <path>"),
            },
            "csv" => match parts.next() {
                Some(path) => {
                    let snapshot = scheduler.export_snapshot();
                    match save_classes_to_csv(&snapshot, scheduler.grid(), path) {
                        Ok(()) => println!("Classes written to {}", path),
                        Err(e) => println!("CSV error: {}", e),
                    }
                }
                None => println!("Usage: csv <path>"),
            },
            "clear" => {
                if scheduler.clear_all() {
                    println!("All data cleared.");
                } else {
                    println!("Data cleared in memory; persisted copy could not be erased.");
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}

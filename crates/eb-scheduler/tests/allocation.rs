//! End-to-end allocation over datasets read through the codec.

use chrono::{NaiveDate, NaiveTime};
use eb_codec::read_dataset;
use eb_core::{AllocationConfig, Entity, Exam, ExamKind, Registry, Session, Student, Subject, Venue};
use eb_scheduler::{Allocation, SeatingMode, SessionPlanner, allocate};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

fn nine() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap()
}

fn student(lui: u64, family: &str, subject: &Subject, aara: bool) -> Student {
    let dob = NaiveDate::from_ymd_opt(2007, 6, 30).unwrap();
    let mut student = Student::new(lui, "Kim Ann", family, dob, "Gold", aara);
    student.add_subject(&subject.identity());
    student
}

/// One subject, one exam and a venue, with the students registered and a
/// session created through the planner.
fn block(rows: usize, columns: usize, venue_aara: bool, students: Vec<Student>) -> (Registry, String) {
    let mut registry = Registry::new();
    let chemistry = Subject::new("Chemistry", "Reactions.");
    let exam = Exam::new(&chemistry, ExamKind::External, day(), nine());
    let exam_id = exam.identity();
    registry.add(chemistry).unwrap();
    registry.add(exam).unwrap();
    for student in students {
        registry.add(student).unwrap();
    }
    registry
        .add(Venue::new("HALL", 1, vec!["R1".to_owned()], rows, columns, rows * columns, venue_aara))
        .unwrap();
    (registry, exam_id)
}

fn chemistry() -> Subject {
    Subject::new("Chemistry", "Reactions.")
}

fn occupant_at(registry: &Registry, session: &str, number: usize) -> Option<String> {
    registry
        .get::<Session>(session)
        .unwrap()
        .desks()
        .get(number - 1)
        .and_then(|desk| desk.occupant())
        .map(|occupant| occupant.family_name.clone())
}

#[test]
fn test_five_by_two_sparse_layout() {
    let subject = chemistry();
    // Registered out of order; allocation sorts by family name.
    let students = vec![
        student(4, "Davis", &subject, false),
        student(2, "Brown", &subject, false),
        student(1, "Adams", &subject, false),
        student(3, "Clark", &subject, false),
    ];
    let (mut registry, exam) = block(5, 2, false, students);
    let mut planner = SessionPlanner::new(&mut registry);
    let session = planner.create_session_for_exam("HALL", &exam).unwrap();

    let allocation = planner.allocate_session(&session).unwrap();
    assert_eq!(allocation.report().unwrap().mode, SeatingMode::Sparse);

    for (number, family) in [(1, "Adams"), (2, "Brown"), (3, "Clark"), (4, "Davis")] {
        assert_eq!(occupant_at(&registry, &session, number).as_deref(), Some(family));
    }
    assert_eq!(occupant_at(&registry, &session, 5), None);
}

#[test]
fn test_full_capacity_single_exam() {
    let subject = chemistry();
    let students = (1..=6)
        .map(|n| student(n, &format!("Family{n}"), &subject, false))
        .collect();
    let (mut registry, exam) = block(3, 2, false, students);
    let mut planner = SessionPlanner::new(&mut registry);
    let session = planner.create_session_for_exam("HALL", &exam).unwrap();

    let allocation = planner.allocate_session(&session).unwrap();
    let report = allocation.report().unwrap();
    assert_eq!(report.mode, SeatingMode::Dense);
    assert_eq!(report.inter_gap, 0);
    assert_eq!(report.seated, 6);
    assert_eq!(registry.get::<Session>(&session).unwrap().remaining_desks(), 0);
}

#[test]
fn test_aara_students_never_seated_in_general_venue() {
    let subject = chemistry();
    let students = vec![
        student(1, "Adams", &subject, true),
        student(2, "Brown", &subject, false),
        student(3, "Clark", &subject, true),
    ];
    let (mut registry, exam) = block(2, 2, false, students);
    let mut planner = SessionPlanner::new(&mut registry);
    let session = planner.create_session_for_exam("HALL", &exam).unwrap();

    let seated: Vec<u64> = registry
        .get::<Session>(&session)
        .unwrap()
        .desks()
        .iter()
        .filter_map(|desk| desk.occupant().map(|o| o.lui))
        .collect();
    assert_eq!(seated, [2]);
}

#[test]
fn test_allocation_is_deterministic() {
    let subject = chemistry();
    let students: Vec<Student> = ["Nguyen", "Ali", "Smith", "Ali", "Brown"]
        .iter()
        .zip(1..)
        .map(|(family, lui)| student(lui, family, &subject, false))
        .collect();
    let (mut registry, exam) = block(4, 3, false, students);
    let mut planner = SessionPlanner::new(&mut registry);
    let session = planner.create_session_for_exam("HALL", &exam).unwrap();

    let first = registry.get::<Session>(&session).unwrap().clone();
    let again = allocate(
        registry.session_context(&session).unwrap(),
        &AllocationConfig::default(),
    );
    assert!(!again.is_overflow());
    assert_eq!(registry.get::<Session>(&session).unwrap(), &first);

    // Equal family names keep registration order.
    let luis: Vec<u64> = first
        .desks()
        .iter()
        .filter_map(|desk| desk.occupant().map(|o| o.lui))
        .take(2)
        .collect();
    assert_eq!(luis, [2, 4]);
}

#[test]
fn test_overflow_leaves_desks_untouched() {
    let subject = chemistry();
    let students = (1..=3)
        .map(|n| student(n, &format!("Family{n}"), &subject, false))
        .collect();
    let (mut registry, exam) = block(1, 4, false, students);
    let mut planner = SessionPlanner::new(&mut registry);
    let session = planner.create_session_for_exam("HALL", &exam).unwrap();

    // Enrol more students than desks behind the planner's back.
    registry
        .get_mut::<Session>(&session)
        .unwrap()
        .schedule_exam(&exam, 2);
    let before = registry.get::<Session>(&session).unwrap().clone();

    let allocation = allocate(
        registry.session_context(&session).unwrap(),
        &AllocationConfig::default(),
    );
    assert_eq!(
        allocation,
        Allocation::Overflow {
            students: 5,
            desks: 4
        }
    );
    assert_eq!(registry.get::<Session>(&session).unwrap(), &before);
}

#[test]
fn test_schedule_loaded_dataset_and_allocate() {
    let text = "\
Title: Semester One
Version: 1.0
[Begin]
[Subjects: 2]
1. BIOLOGY
Biology
\"Cells.\"

2. ENGLISH
English
\"Texts.\"

[Units: 0]
[Students: 3]
1. ZOE ANN YOUNG
LUI: 0000000031, Family Name: Young, Given Name(s): Zoe Ann, Date of Birth: 2007-02-03, House: Red, AARA: false
Subjects: Biology, English

2. LIAM HALL
LUI: 0000000032, Family Name: Hall, Given Name(s): Liam, Date of Birth: 2007-04-05, House: Blue, AARA: false
Subjects: Biology

3. MIA PARK
LUI: 0000000033, Family Name: Park, Given Name(s): Mia, Date of Birth: 2007-06-07, House: Blue, AARA: false
Subjects: English

[Exams: 2]
1. Year 12 External Assessment Biology
Subject: Biology, Exam Type: EXTERNAL, Exam Date: 2025-03-10 09:00

2. Year 12 External Assessment English
Subject: English, Exam Type: EXTERNAL, Exam Date: 2025-03-10 09:00

[Rooms: 1]
1. R1

[Venues: 1]
1. GYM (6 desks)
Room Count: 1, Rooms: R1, Rows: 3, Columns: 2, Desks: 6, AARA: false

[Sessions: 0]
[End]
";
    let mut document = read_dataset(text.as_bytes()).unwrap();
    let mut planner = SessionPlanner::new(&mut document.registry);

    let session = planner.create_session_for_exam("GYM", "biology_20250310").unwrap();
    let allocation = planner.add_exam_to_session(&session, "english_20250310").unwrap();

    let report = allocation.report().unwrap();
    assert_eq!(report.seated, 4);
    assert_eq!(report.mode, SeatingMode::Dense);
    assert_eq!(report.inter_gap, 2);

    let registry = &document.registry;
    // Biology: Hall, Young. Gap of two. English: Park, Young.
    assert_eq!(occupant_at(registry, &session, 1).as_deref(), Some("Hall"));
    assert_eq!(occupant_at(registry, &session, 2).as_deref(), Some("Young"));
    assert_eq!(occupant_at(registry, &session, 3), None);
    assert_eq!(occupant_at(registry, &session, 5).as_deref(), Some("Park"));
    assert_eq!(occupant_at(registry, &session, 6).as_deref(), Some("Young"));

    let young = registry.get::<Student>("0000000031").unwrap();
    assert_eq!(young.exams(), ["biology_20250310", "english_20250310"]);
}

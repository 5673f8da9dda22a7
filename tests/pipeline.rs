use weir::pipeline::{RunSummary, run_file, split_stream};

const HEADER: &str = "row_id,pickup_datetime,lat,lon,base";

fn run(input: &str) -> anyhow::Result<(RunSummary, String, String)> {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    let summary = split_stream(input.as_bytes(), &mut accepted, &mut rejected)?;
    Ok((
        summary,
        String::from_utf8(accepted)?,
        String::from_utf8(rejected)?,
    ))
}

fn data_rows(partition: &str) -> Vec<&str> {
    partition.lines().skip(1).collect()
}

fn csv_with(rows: &[&str]) -> String {
    let mut out = String::from(HEADER);
    for row in rows {
        out.push('\n');
        out.push_str(row);
    }
    out.push('\n');
    out
}

#[test]
fn counts_always_sum_to_total() -> anyhow::Result<()> {
    let input = csv_with(&[
        "1,4/18/2014 21:38:00,40.7690,-73.9549,B02682",
        "2,,40.7267,-74.0345,B02682",
        "abc,4/18/2014 21:40:00,40.7316,-73.9873,B02617",
        "1,4/18/2014 21:41:00,40.7588,-73.9776,B02617",
    ]);
    let (summary, _, _) = run(&input)?;
    assert_eq!(summary.total_rows, 4);
    assert_eq!(
        summary.accepted_rows + summary.rejected_rows,
        summary.total_rows
    );
    assert_eq!(
        summary.invalid_rows + summary.duplicate_rows,
        summary.rejected_rows
    );
    Ok(())
}

#[test]
fn fault_stride_rejects_exactly_the_blanked_rows() -> anyhow::Result<()> {
    // 10 rows, pickup_datetime blanked on row 5 (generator stride 5).
    let rows: Vec<String> = (1..=10u32)
        .map(|i| {
            let pickup = if i == 5 { "" } else { "4/1/2014 0:03:00" };
            format!("{i},{pickup},40.73,-73.99,B02512")
        })
        .collect();
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let (summary, accepted, rejected) = run(&csv_with(&refs))?;

    assert_eq!(summary.accepted_rows, 9);
    assert_eq!(summary.rejected_rows, 1);
    assert_eq!(summary.invalid_rows, 1);
    assert_eq!(summary.duplicate_rows, 0);
    assert_eq!(data_rows(&accepted).len(), 9);
    let rej = data_rows(&rejected);
    assert_eq!(rej.len(), 1);
    assert!(rej[0].starts_with("5,"));
    Ok(())
}

#[test]
fn first_occurrence_wins_later_duplicates_rejected() -> anyhow::Result<()> {
    // row_id 1, 1, 2: the first 1 is accepted, the second rejected.
    let input = csv_with(&[
        "1,4/18/2014 21:38:00,40.76,-73.95,B02682",
        "1,4/18/2014 21:39:00,40.72,-74.03,B02682",
        "2,4/18/2014 21:40:00,40.73,-73.98,B02617",
    ]);
    let (summary, accepted, rejected) = run(&input)?;

    assert_eq!(summary.accepted_rows, 2);
    assert_eq!(summary.rejected_rows, 1);
    assert_eq!(summary.duplicate_rows, 1);
    assert_eq!(summary.distinct_keys, 2);

    let acc = data_rows(&accepted);
    assert!(acc[0].contains("21:38:00"), "first occurrence kept: {acc:?}");
    assert!(acc[1].starts_with("2,"));
    assert!(data_rows(&rejected)[0].contains("21:39:00"));
    Ok(())
}

#[test]
fn invalid_first_occurrence_still_consumes_the_key() -> anyhow::Result<()> {
    // The invalid row registers key 7; the valid copy is then a duplicate.
    let input = csv_with(&[
        "7,,40.76,-73.95,B02682",
        "7,4/18/2014 21:39:00,40.72,-74.03,B02682",
    ]);
    let (summary, _, rejected) = run(&input)?;

    assert_eq!(summary.accepted_rows, 0);
    assert_eq!(summary.rejected_rows, 2);
    assert_eq!(summary.invalid_rows, 1);
    assert_eq!(summary.duplicate_rows, 1);
    assert_eq!(summary.distinct_keys, 1);
    assert_eq!(data_rows(&rejected).len(), 2);
    Ok(())
}

#[test]
fn absent_row_ids_are_never_deduplicated_against_each_other() -> anyhow::Result<()> {
    let input = csv_with(&[
        ",4/18/2014 21:38:00,40.76,-73.95,B02682",
        ",4/18/2014 21:39:00,40.72,-74.03,B02682",
        "3,4/18/2014 21:40:00,40.73,-73.98,B02617",
    ]);
    let (summary, _, _) = run(&input)?;

    assert_eq!(summary.accepted_rows, 1);
    assert_eq!(summary.rejected_rows, 2);
    // Both blanks are validity rejects; neither registers a key, so the
    // second is not a duplicate of the first.
    assert_eq!(summary.invalid_rows, 2);
    assert_eq!(summary.duplicate_rows, 0);
    assert_eq!(summary.distinct_keys, 1);
    Ok(())
}

#[test]
fn partitions_preserve_arrival_order() -> anyhow::Result<()> {
    let input = csv_with(&[
        "5,4/1/2014 0:01:00,40.1,-73.1,B1",
        "6,,40.2,-73.2,B2",
        "3,4/1/2014 0:02:00,40.3,-73.3,B3",
        "9,,40.4,-73.4,B4",
        "8,4/1/2014 0:03:00,40.5,-73.5,B5",
    ]);
    let (_, accepted, rejected) = run(&input)?;

    let acc_ids: Vec<&str> = data_rows(&accepted)
        .iter()
        .map(|r| r.split(',').next().unwrap())
        .collect();
    let rej_ids: Vec<&str> = data_rows(&rejected)
        .iter()
        .map(|r| r.split(',').next().unwrap())
        .collect();
    assert_eq!(acc_ids, ["5", "3", "8"]);
    assert_eq!(rej_ids, ["6", "9"]);
    Ok(())
}

#[test]
fn header_is_replicated_to_both_partitions() -> anyhow::Result<()> {
    let input = csv_with(&["1,4/1/2014 0:01:00,40.1,-73.1,B1"]);
    let (_, accepted, rejected) = run(&input)?;
    assert_eq!(accepted.lines().next(), Some(HEADER));
    assert_eq!(rejected.lines().next(), Some(HEADER));
    Ok(())
}

#[test]
fn header_only_input_is_a_zero_row_success() -> anyhow::Result<()> {
    let (summary, accepted, rejected) = run(&format!("{HEADER}\n"))?;
    assert_eq!(summary.total_rows, 0);
    assert_eq!(summary.accepted_rows, 0);
    assert_eq!(summary.rejected_rows, 0);
    assert_eq!(data_rows(&accepted).len(), 0);
    assert_eq!(data_rows(&rejected).len(), 0);
    Ok(())
}

#[test]
fn entirely_empty_input_is_a_zero_row_success() -> anyhow::Result<()> {
    let (summary, accepted, rejected) = run("")?;
    assert_eq!(summary.total_rows, 0);
    assert!(accepted.is_empty());
    assert!(rejected.is_empty());
    Ok(())
}

#[test]
fn unparsable_gating_fields_reject_the_row() -> anyhow::Result<()> {
    let input = csv_with(&[
        "abc,4/1/2014 0:01:00,40.1,-73.1,B1",
        "2,2014-04-01 00:01:00,40.1,-73.1,B1",
        "3,4/1/2014 0:01:00,40.1,-73.1,B1",
    ]);
    let (summary, accepted, _) = run(&input)?;
    assert_eq!(summary.accepted_rows, 1);
    assert_eq!(summary.invalid_rows, 2);
    assert!(data_rows(&accepted)[0].starts_with("3,"));
    Ok(())
}

#[test]
fn coordinates_and_base_never_gate_acceptance() -> anyhow::Result<()> {
    let input = csv_with(&["1,4/1/2014 0:01:00,not-a-float,,"]);
    let (summary, _, _) = run(&input)?;
    assert_eq!(summary.accepted_rows, 1);
    assert_eq!(summary.rejected_rows, 0);
    Ok(())
}

#[test]
fn short_rows_are_defects_not_errors() -> anyhow::Result<()> {
    let input = csv_with(&["42", "2,4/1/2014 0:01:00,40.1,-73.1,B1"]);
    let (summary, accepted, rejected) = run(&input)?;
    assert_eq!(summary.total_rows, 2);
    assert_eq!(summary.accepted_rows, 1);
    assert!(data_rows(&rejected)[0].starts_with("42"));
    assert!(data_rows(&accepted)[0].starts_with("2,"));
    Ok(())
}

#[test]
fn larger_stream_counts_match_the_stride_arithmetic() -> anyhow::Result<()> {
    // 10_000 distinct ids, every 100th pickup blanked: 100 invalid rows.
    let mut input = String::from(HEADER);
    for i in 1..=10_000u32 {
        let pickup = if i % 100 == 0 { "" } else { "4/1/2014 0:03:00" };
        input.push_str(&format!("\n{i},{pickup},40.73,-73.99,B02512"));
    }
    let (summary, _, _) = run(&input)?;
    assert_eq!(summary.total_rows, 10_000);
    assert_eq!(summary.accepted_rows, 9_900);
    assert_eq!(summary.rejected_rows, 100);
    assert_eq!(summary.distinct_keys, 10_000);
    Ok(())
}

#[test]
fn run_file_round_trip_and_timing() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("input.csv");
    std::fs::write(
        &input,
        csv_with(&[
            "1,4/1/2014 0:01:00,40.1,-73.1,B1",
            "1,4/1/2014 0:02:00,40.2,-73.2,B2",
            "2,,40.3,-73.3,B3",
        ]),
    )?;
    // Partition paths in a directory that does not exist yet.
    let accepted = tmp.path().join("out").join("accepted.csv");
    let rejected = tmp.path().join("out").join("rejected.csv");

    let summary = run_file(&input, &accepted, &rejected)?;
    assert_eq!(summary.total_rows, 3);
    assert_eq!(summary.accepted_rows, 1);
    assert_eq!(summary.rejected_rows, 2);
    assert!(summary.wall_time_s >= 0.0);

    let accepted = std::fs::read_to_string(&accepted)?;
    assert_eq!(data_rows(&accepted).len(), 1);
    Ok(())
}

#[test]
fn run_file_missing_input_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let result = run_file(
        tmp.path().join("nope.csv"),
        tmp.path().join("a.csv"),
        tmp.path().join("r.csv"),
    );
    assert!(result.is_err());
}

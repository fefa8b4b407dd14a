use anyhow::Result;

fn main() -> Result<()> {
    let mut book = umya_spreadsheet::new_file();

    let sheet = book.get_active_sheet_mut();
    sheet.set_name("UAT Sign-Off");

    // Row 1 is a header; identifiers live in column B, result in F, notes in G.
    let header = ["#", "Test ID", "Area", "Steps", "Expected", "Result", "Notes"];
    for (i, value) in header.iter().enumerate() {
        sheet.get_cell_mut((i as u32 + 1, 1u32)).set_value(*value);
    }

    let cases = [
        ("P1-01", "Login", "All roles can login"),
        ("P1-02", "Incidents", "Worker creates incident"),
        ("P1-03", "Incidents", "Manager updates status"),
        ("P1-04", "Dashboard", "Counts and severity colors"),
    ];
    for (i, (id, area, expected)) in cases.iter().enumerate() {
        let row = i as u32 + 2;
        sheet.get_cell_mut((1u32, row)).set_value_number((i + 1) as f64);
        sheet.get_cell_mut((2u32, row)).set_value(*id);
        sheet.get_cell_mut((3u32, row)).set_value(*area);
        sheet.get_cell_mut((5u32, row)).set_value(*expected);
    }

    umya_spreadsheet::writer::xlsx::write(&book, "signoff_sample.xlsx")?;
    println!("Wrote signoff_sample.xlsx");
    Ok(())
}

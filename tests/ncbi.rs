use camino::Utf8PathBuf;

use bpa_submission_generator::ncbi::{
    BioSampleRow, LibraryFields, SequenceFile, SraRow, TemplateNames, plan_submission,
    write_sra_biosample,
};
use bpa_submission_generator::store::SubmissionStore;

fn biosample(sample_name: &str) -> BioSampleRow {
    BioSampleRow {
        sample_name: sample_name.to_string(),
        collection_date: "2015".to_string(),
        geo_loc_name: "Australia: Mallee".to_string(),
        lat_lon: "35.000000 S 142.000000 E".to_string(),
        bioproject_accession: "PRJNA317932".to_string(),
        depth: "0.1".to_string(),
        isolate: format!("{sample_name}_0"),
        organism: "soil metagenome".to_string(),
        isolation_source: "Soil".to_string(),
    }
}

fn sra(sample_name: Option<&str>, library_id: &str) -> SraRow {
    SraRow {
        bioproject_accession: "PRJNA317932".to_string(),
        biosample_accession: if sample_name.is_some() {
            String::new()
        } else {
            "SAMN0001".to_string()
        },
        sample_name: sample_name.map(str::to_string),
        library: LibraryFields {
            library_id: library_id.to_string(),
            title: "Soil_metagenomics".to_string(),
            library_strategy: "WGS".to_string(),
            library_source: "METAGENOMIC".to_string(),
            instrument_model: "Illumina HiSeq 2500".to_string(),
        },
        library_selection: "PCR".to_string(),
        library_layout: "paired".to_string(),
        platform: "ILLUMINA".to_string(),
        design_description: "http://www.bioplatforms.com/soil-biodiversity/".to_string(),
        reference_genome_assembly: String::new(),
        alignment_software: String::new(),
        forward_read_length: "150".to_string(),
        reverse_read_length: "150".to_string(),
        files: vec![SequenceFile {
            filetype: "fastq".to_string(),
            filename: format!("{library_id}_R1.fastq.gz"),
            md5: "0".to_string(),
        }],
    }
}

#[test]
fn biosamples_follow_their_sra_rows() {
    let biosamples = vec![
        biosample("102.100.100/7"),
        biosample("102.100.100/12"),
        biosample("102.100.100/3"),
    ];
    let sra_rows = vec![
        sra(Some("102.100.100/12"), "12_A"),
        sra(Some("102.100.100/3"), "3_A"),
        sra(Some("102.100.100/3"), "3_B"),
        sra(Some("102.100.100/12"), "12_B"),
    ];

    let plan = plan_submission(&biosamples, &sra_rows, 2);

    assert_eq!(plan.chunks.len(), 2);
    assert_eq!(plan.chunks[0].number, 1);
    assert_eq!(plan.chunks[0].sample_names, vec!["102.100.100/3"]);
    assert_eq!(plan.chunks[0].biosamples.len(), 1);
    assert_eq!(plan.chunks[0].biosamples[0].sample_name, "102.100.100/3");
    assert_eq!(plan.chunks[0].sra.len(), 2);
    assert_eq!(plan.chunks[1].sample_names, vec!["102.100.100/12"]);
    assert_eq!(plan.chunks[1].sra.len(), 2);

    let unmatched: Vec<&str> = plan
        .unmatched_biosamples
        .iter()
        .map(|row| row.sample_name.as_str())
        .collect();
    assert_eq!(unmatched, vec!["102.100.100/7"]);
}

#[test]
fn final_partial_chunk_is_kept() {
    let biosamples = vec![biosample("a/1"), biosample("a/2"), biosample("a/3")];
    let sra_rows = vec![sra(Some("a/1"), "1"), sra(Some("a/2"), "2"), sra(Some("a/3"), "3")];

    let plan = plan_submission(&biosamples, &sra_rows, 2);

    assert_eq!(plan.chunks.len(), 2);
    assert_eq!(plan.chunks[1].sample_names, vec!["a/3"]);
    assert_eq!(plan.chunks[1].biosamples.len(), 1);
}

#[test]
fn existing_samples_are_chunked_separately() {
    let sra_rows = vec![
        sra(None, "1"),
        sra(None, "2"),
        sra(None, "3"),
        sra(Some("a/4"), "4"),
    ];

    let plan = plan_submission(&[], &sra_rows, 2);

    assert_eq!(plan.existing_samples.len(), 2);
    assert_eq!(plan.existing_samples[0].len(), 2);
    assert_eq!(plan.existing_samples[1].len(), 1);
    assert_eq!(plan.chunks.len(), 1);
    assert!(plan.chunks[0].biosamples.is_empty());
}

#[test]
fn every_depth_of_a_sample_shares_its_biosample_file() {
    let mut shallow = biosample("102.100.100/7");
    shallow.depth = "0".to_string();
    shallow.isolate = "102.100.100/7_0".to_string();
    let mut deep = biosample("102.100.100/7");
    deep.depth = "30".to_string();
    deep.isolate = "102.100.100/7_30".to_string();
    let biosamples = vec![shallow, biosample("102.100.100/8"), deep];
    let sra_rows = vec![
        sra(Some("102.100.100/7"), "7_A"),
        sra(Some("102.100.100/8"), "8_A"),
    ];

    let temp = tempfile::tempdir().unwrap();
    let store = SubmissionStore::new(Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap());
    let names = TemplateNames {
        biosample_base: "biosample".to_string(),
        sra_base: "sra".to_string(),
        biosample_custom_fields: vec!["depth", "isolate"],
    };

    let plan = plan_submission(&biosamples, &sra_rows, 1);
    let written = write_sra_biosample(&store, &names, &plan).unwrap();

    assert_eq!(written.len(), 4);
    let first = std::fs::read_to_string(store.path_for("biosample-1.tsv").as_std_path()).unwrap();
    assert!(first.contains("102.100.100/7_0"));
    assert!(first.contains("102.100.100/7_30"));
    assert!(!first.contains("102.100.100/8"));
    let second = std::fs::read_to_string(store.path_for("biosample-2.tsv").as_std_path()).unwrap();
    assert!(second.contains("102.100.100/8_0"));
    assert!(!second.contains("102.100.100/7"));
}

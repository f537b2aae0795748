/*!

# Quick start with an online form

This walkthrough shows how to analyze a survey collected with an online form
tool. Microsoft Forms and Google Forms both export responses as spreadsheets;
any tool that can produce an Excel or CSV file with one row per respondent
will do.

**Designing the survey.** Use one column per question, rated on a shared
agreement scale ("Strongly Disagree" through "Strongly Agree", or the numbers
1 to 5 directly). Add one column for the respondent's team and one for their
location; these are the two dimensions the analysis can slice by. Free-text
remark columns can sit next to the rated questions.

**Exporting the responses.** Download the collected responses as an `.xlsx`
workbook (or export them as CSV). The first row must contain the column
headers.

**Describing the survey.** Write a small JSON configuration that names the
data file, the team and location columns, the categories with their
questions, and the label mapping:

```json
{
  "outputSettings": {
    "surveyName": "Team Pulse 2026",
    "outputDirectory": "output"
  },
  "responseFileSources": [
    {
      "provider": "excel",
      "filePath": "responses.xlsx",
      "teamColumn": "Team",
      "locationColumn": "Location"
    }
  ],
  "categories": [
    {
      "name": "Culture",
      "questions": ["I feel heard by my team", "I can raise concerns safely"]
    }
  ],
  "scale": {
    "min": 1,
    "max": 5,
    "labels": {
      "Strongly Disagree": 1,
      "Disagree": 2,
      "Neutral": 3,
      "Agree": 4,
      "Strongly Agree": 5
    }
  }
}
```

**Running the analysis.**

```bash
likertlens --config survey_config.json
```

The tool lists the teams and locations it found, asks which combination to
analyze (or takes `--team`/`--location` on the command line), and writes a
JSON summary plus a text report into a timestamped run directory.

For embedding the engine in another program, see [`crate::builder::Builder`].

*/
